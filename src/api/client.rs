use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use rust_decimal::prelude::ToPrimitive;
use serde_json::{json, Value};
use tracing::{debug, warn};
use url::Url;

use super::account::{
    history_from_list, portfolio_from_value, receipt_from_value, user_from_value,
    wallet_from_value,
};
use super::backend::Backend;
use super::envelope::{error_message, parse_body};
use super::quote::{candles_from_list, details_from_value, quotes_from_list};
use crate::data::{
    Candle, ChartInterval, ListOption, Portfolio, Quote, StockDetails, Symbol, TradeReceipt,
    TradeRecord, User, Wallet,
};
use crate::error::FetchError;
use crate::trade::TradeIntent;

/// `{symbol, quantity, price}` with the price as a JSON number
fn trade_body(intent: &TradeIntent) -> Result<Value, FetchError> {
    let price = intent
        .price
        .to_f64()
        .filter(|price| price.is_finite())
        .ok_or_else(|| FetchError::Encode(format!("price {} is not a number", intent.price)))?;
    Ok(json!({
        "symbol": intent.symbol,
        "quantity": intent.quantity,
        "price": price,
    }))
}

/// REST client for the trading backend
pub struct HttpBackend {
    http: Client,
    base: Url,
    token: Option<String>,
    timeout: Duration,
}

impl HttpBackend {
    pub fn new(base: Url, token: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("stocksim/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base,
            token: token.filter(|t| !t.trim().is_empty()),
            timeout,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| FetchError::Transport(format!("invalid base url: {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, FetchError> {
        let url = self.endpoint(segments)?;
        let builder = self.http.request(method, url);
        Ok(match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    fn map_transport(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Transport(err.without_url().to_string())
        }
    }

    /// Send a request and unwrap the response envelope
    async fn send(&self, builder: RequestBuilder) -> Result<Value, FetchError> {
        let request = builder
            .build()
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        let method = request.method().clone();
        let path = request.url().path().to_string();

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|err| self.map_transport(err))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| self.map_transport(err))?;

        if !status.is_success() {
            let message = error_message(&body);
            warn!(%method, %path, status = status.as_u16(), ?message, "request failed");
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        debug!(%method, %path, bytes = body.len(), "response");
        parse_body(&body).inspect_err(|err| warn!(%method, %path, error = %err, "rejected"))
    }

    async fn get(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Value, FetchError> {
        let builder = self.request(Method::GET, segments)?.query(query);
        self.send(builder).await
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Quote>, FetchError> {
        let data = self
            .get(
                &["stocks", "search"],
                &[("query", query.to_string()), ("limit", limit.to_string())],
            )
            .await?;
        Ok(quotes_from_list(data))
    }

    async fn stock_list(
        &self,
        option: ListOption,
        limit: usize,
    ) -> Result<Vec<Quote>, FetchError> {
        let data = self
            .get(
                &["stocks", "list"],
                &[
                    ("option", option.as_param().to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(quotes_from_list(data))
    }

    async fn details(&self, symbol: &Symbol) -> Result<StockDetails, FetchError> {
        let data = self.get(&["stocks", symbol.as_str()], &[]).await?;
        details_from_value(symbol, &data)
    }

    async fn chart(
        &self,
        symbol: &Symbol,
        interval: ChartInterval,
        limit: usize,
    ) -> Result<Vec<Candle>, FetchError> {
        let data = self
            .get(
                &["stocks", "chart"],
                &[
                    ("symbol", symbol.to_string()),
                    ("interval", interval.as_param().to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(candles_from_list(data))
    }

    async fn submit_trade(&self, intent: &TradeIntent) -> Result<TradeReceipt, FetchError> {
        let body = trade_body(intent)?;
        let builder = self
            .request(Method::POST, &["trades", intent.side.path()])?
            .json(&body);
        let data = self.send(builder).await?;
        Ok(receipt_from_value(intent, &data))
    }

    async fn trade_history(&self, limit: usize) -> Result<Vec<TradeRecord>, FetchError> {
        let data = self
            .get(&["trades", "history"], &[("limit", limit.to_string())])
            .await?;
        Ok(history_from_list(data))
    }

    async fn favorites(&self) -> Result<Vec<Quote>, FetchError> {
        let data = self.get(&["favorites"], &[]).await?;
        Ok(quotes_from_list(data))
    }

    async fn add_favorite(&self, symbol: &Symbol) -> Result<(), FetchError> {
        let builder = self
            .request(Method::POST, &["favorites"])?
            .json(&json!({ "symbol": symbol }));
        self.send(builder).await.map(|_| ())
    }

    async fn remove_favorite(&self, symbol: &Symbol) -> Result<(), FetchError> {
        let builder = self.request(Method::DELETE, &["favorites", symbol.as_str()])?;
        self.send(builder).await.map(|_| ())
    }

    async fn wallet(&self) -> Result<Wallet, FetchError> {
        let data = self.get(&["wallet"], &[]).await?;
        wallet_from_value(&data)
    }

    async fn portfolio(&self) -> Result<Portfolio, FetchError> {
        let data = self.get(&["portfolio", "overall"], &[]).await?;
        portfolio_from_value(&data)
    }

    async fn whoami(&self) -> Result<Option<User>, FetchError> {
        if self.token.is_none() {
            return Ok(None);
        }
        match self.get(&["users", "whoami"], &[]).await {
            Ok(data) if data.is_null() => Ok(None),
            Ok(data) => user_from_value(&data).map(Some),
            Err(err) if err.is_unauthorized() => Ok(None),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{trade_body, HttpBackend};
    use crate::data::{Symbol, TradeSide};
    use crate::trade::TradeIntent;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::time::Duration;
    use url::Url;

    #[test]
    fn trade_body_carries_numeric_price() {
        let intent = TradeIntent::new(Symbol::new("nvda"), TradeSide::Buy, 2, dec!(467.70))
            .expect("intent");
        let body = trade_body(&intent).expect("body");
        assert_eq!(
            body,
            json!({ "symbol": "NVDA", "quantity": 2, "price": 467.7 })
        );
    }

    fn backend(base: &str) -> HttpBackend {
        let base = Url::parse(base).expect("valid url");
        HttpBackend::new(base, Some("  ".to_string()), Duration::from_secs(1)).expect("client")
    }

    #[test]
    fn endpoints_extend_base_path() {
        let backend = backend("http://localhost:3000/api/");
        let url = backend.endpoint(&["stocks", "search"]).expect("url");
        assert_eq!(url.as_str(), "http://localhost:3000/api/stocks/search");

        let backend = self::backend("http://localhost:3000/api");
        let url = backend.endpoint(&["favorites", "BRK/B"]).expect("url");
        assert_eq!(url.as_str(), "http://localhost:3000/api/favorites/BRK%2FB");
    }

    #[test]
    fn blank_token_is_ignored() {
        assert!(backend("http://localhost").token.is_none());
    }

    #[tokio::test]
    async fn whoami_without_token_is_anonymous() {
        use super::Backend;
        let backend = backend("http://127.0.0.1:9");
        assert_eq!(backend.whoami().await, Ok(None));
    }
}
