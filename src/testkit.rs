//! In-memory backend for tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::api::Backend;
use crate::data::{
    Candle, ChartInterval, ListOption, Portfolio, Quote, StockDetails, Symbol, TradeReceipt,
    TradeRecord, User, Wallet,
};
use crate::error::FetchError;
use crate::trade::TradeIntent;

#[derive(Default)]
struct Inner {
    search: HashMap<String, Vec<Quote>>,
    search_delay: HashMap<String, Duration>,
    search_calls: Vec<String>,
    hot: Vec<Quote>,
    list_calls: usize,
    favorites: Vec<Quote>,
    favorites_calls: usize,
    favorite_writes: Vec<(Symbol, bool)>,
    favorite_error: Option<FetchError>,
    trade_calls: usize,
    last_trade: Option<TradeIntent>,
    trade_error: Option<FetchError>,
    wallet_calls: usize,
    portfolio_calls: usize,
    history_calls: usize,
    user: Option<User>,
}

/// Scriptable [`Backend`] that counts calls. Writes can be held behind a gate.
#[derive(Clone, Default)]
pub struct FakeBackend {
    inner: Arc<Mutex<Inner>>,
    gate: Option<Arc<Semaphore>>,
}

impl FakeBackend {
    fn with<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut inner)
    }

    async fn pass_gate(&self) {
        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
    }

    #[must_use]
    pub fn search_result(self, query: &str, quotes: Vec<Quote>) -> Self {
        self.with(|i| i.search.insert(query.to_string(), quotes));
        self
    }

    #[must_use]
    pub fn search_delay(self, query: &str, delay: Duration) -> Self {
        self.with(|i| i.search_delay.insert(query.to_string(), delay));
        self
    }

    #[must_use]
    pub fn hot_list(self, quotes: Vec<Quote>) -> Self {
        self.with(|i| i.hot = quotes);
        self
    }

    #[must_use]
    pub fn favorites_list(self, quotes: Vec<Quote>) -> Self {
        self.with(|i| i.favorites = quotes);
        self
    }

    #[must_use]
    pub fn failing_favorite_writes(self, err: FetchError) -> Self {
        self.with(|i| i.favorite_error = Some(err));
        self
    }

    #[must_use]
    pub fn failing_trades(self, err: FetchError) -> Self {
        self.with(|i| i.trade_error = Some(err));
        self
    }

    #[must_use]
    pub fn user(self, username: &str) -> Self {
        self.with(|i| {
            i.user = Some(User {
                id: "1".to_string(),
                username: username.to_string(),
                email: None,
            });
        });
        self
    }

    /// Hold trade and favorite writes until [`Self::release`] is called
    #[must_use]
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    pub fn release(&self, writes: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(writes);
        }
    }

    pub fn search_calls(&self) -> Vec<String> {
        self.with(|i| i.search_calls.clone())
    }

    pub fn list_calls(&self) -> usize {
        self.with(|i| i.list_calls)
    }

    pub fn favorites_calls(&self) -> usize {
        self.with(|i| i.favorites_calls)
    }

    pub fn favorite_writes(&self) -> Vec<(Symbol, bool)> {
        self.with(|i| i.favorite_writes.clone())
    }

    pub fn trade_calls(&self) -> usize {
        self.with(|i| i.trade_calls)
    }

    pub fn last_trade(&self) -> Option<TradeIntent> {
        self.with(|i| i.last_trade.clone())
    }

    pub fn wallet_calls(&self) -> usize {
        self.with(|i| i.wallet_calls)
    }

    pub fn portfolio_calls(&self) -> usize {
        self.with(|i| i.portfolio_calls)
    }

    pub fn history_calls(&self) -> usize {
        self.with(|i| i.history_calls)
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Quote>, FetchError> {
        let (delay, mut quotes) = self.with(|i| {
            i.search_calls.push(query.to_string());
            (
                i.search_delay.get(query).copied(),
                i.search.get(query).cloned().unwrap_or_default(),
            )
        });
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        quotes.truncate(limit);
        Ok(quotes)
    }

    async fn stock_list(&self, _option: ListOption, limit: usize) -> Result<Vec<Quote>, FetchError> {
        Ok(self.with(|i| {
            i.list_calls += 1;
            i.hot.iter().take(limit).cloned().collect()
        }))
    }

    async fn details(&self, symbol: &Symbol) -> Result<StockDetails, FetchError> {
        let quote = self.with(|i| {
            i.hot
                .iter()
                .chain(i.search.values().flatten())
                .find(|q| &q.symbol == symbol)
                .cloned()
        });
        quote
            .map(|quote| StockDetails {
                quote,
                ..StockDetails::default()
            })
            .ok_or_else(|| FetchError::Status {
                status: 404,
                message: Some("not found".to_string()),
            })
    }

    async fn chart(
        &self,
        _symbol: &Symbol,
        _interval: ChartInterval,
        _limit: usize,
    ) -> Result<Vec<Candle>, FetchError> {
        Ok(vec![])
    }

    async fn submit_trade(&self, intent: &TradeIntent) -> Result<TradeReceipt, FetchError> {
        let error = self.with(|i| {
            i.trade_calls += 1;
            i.last_trade = Some(intent.clone());
            i.trade_error.clone()
        });
        self.pass_gate().await;
        match error {
            Some(err) => Err(err),
            None => Ok(TradeReceipt {
                id: Some(format!("t{}", self.trade_calls())),
                symbol: intent.symbol.clone(),
                side: intent.side,
                quantity: intent.quantity,
                price: intent.price,
                total: Some(intent.total()),
            }),
        }
    }

    async fn trade_history(&self, _limit: usize) -> Result<Vec<TradeRecord>, FetchError> {
        self.with(|i| i.history_calls += 1);
        Ok(vec![])
    }

    async fn favorites(&self) -> Result<Vec<Quote>, FetchError> {
        Ok(self.with(|i| {
            i.favorites_calls += 1;
            i.favorites.clone()
        }))
    }

    async fn add_favorite(&self, symbol: &Symbol) -> Result<(), FetchError> {
        let error = self.with(|i| {
            i.favorite_writes.push((symbol.clone(), true));
            i.favorite_error.clone()
        });
        self.pass_gate().await;
        if let Some(err) = error {
            return Err(err);
        }
        self.with(|i| {
            if !i.favorites.iter().any(|q| &q.symbol == symbol) {
                let quote = i
                    .hot
                    .iter()
                    .find(|q| &q.symbol == symbol)
                    .cloned()
                    .unwrap_or_else(|| Quote {
                        symbol: symbol.clone(),
                        ..Quote::default()
                    });
                i.favorites.push(quote);
            }
        });
        Ok(())
    }

    async fn remove_favorite(&self, symbol: &Symbol) -> Result<(), FetchError> {
        let error = self.with(|i| {
            i.favorite_writes.push((symbol.clone(), false));
            i.favorite_error.clone()
        });
        self.pass_gate().await;
        if let Some(err) = error {
            return Err(err);
        }
        self.with(|i| i.favorites.retain(|q| &q.symbol != symbol));
        Ok(())
    }

    async fn wallet(&self) -> Result<Wallet, FetchError> {
        self.with(|i| i.wallet_calls += 1);
        Ok(Wallet {
            balance: rust_decimal_macros::dec!(100000),
            currency: "USD".to_string(),
        })
    }

    async fn portfolio(&self) -> Result<Portfolio, FetchError> {
        self.with(|i| i.portfolio_calls += 1);
        Ok(Portfolio::default())
    }

    async fn whoami(&self) -> Result<Option<User>, FetchError> {
        Ok(self.with(|i| i.user.clone()))
    }
}
