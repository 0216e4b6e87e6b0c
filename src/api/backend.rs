use async_trait::async_trait;

use crate::data::{
    Candle, ChartInterval, ListOption, Portfolio, Quote, StockDetails, Symbol, TradeReceipt,
    TradeRecord, User, Wallet,
};
use crate::error::FetchError;
use crate::trade::TradeIntent;

/// Everything the dashboard asks of the trading backend.
///
/// Implementations return already-normalised records; callers never see wire shapes.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Quote>, FetchError>;

    async fn stock_list(&self, option: ListOption, limit: usize)
        -> Result<Vec<Quote>, FetchError>;

    async fn details(&self, symbol: &Symbol) -> Result<StockDetails, FetchError>;

    async fn chart(
        &self,
        symbol: &Symbol,
        interval: ChartInterval,
        limit: usize,
    ) -> Result<Vec<Candle>, FetchError>;

    async fn submit_trade(&self, intent: &TradeIntent) -> Result<TradeReceipt, FetchError>;

    async fn trade_history(&self, limit: usize) -> Result<Vec<TradeRecord>, FetchError>;

    async fn favorites(&self) -> Result<Vec<Quote>, FetchError>;

    async fn add_favorite(&self, symbol: &Symbol) -> Result<(), FetchError>;

    async fn remove_favorite(&self, symbol: &Symbol) -> Result<(), FetchError>;

    async fn wallet(&self) -> Result<Wallet, FetchError>;

    async fn portfolio(&self) -> Result<Portfolio, FetchError>;

    /// `None` when the backend does not recognise the session
    async fn whoami(&self) -> Result<Option<User>, FetchError>;
}
