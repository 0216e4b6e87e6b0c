use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ticker symbol, always trimmed and uppercase (e.g. `AAPL`, `BRK.B`)
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Symbol {
    inner: String,
}

impl Symbol {
    pub fn new(symbol: &str) -> Self {
        Self {
            inner: symbol.trim().to_ascii_uppercase(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.inner
    }
}

/// Point-in-time price record for a ticker.
///
/// `change_percent` is in percent units: `1.25` means +1.25%.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: Symbol,
    pub name: String,
    pub price: Decimal,
    pub change_percent: Decimal,
}

impl Quote {
    pub fn new(symbol: &str, name: &str, price: Decimal, change_percent: Decimal) -> Self {
        Self {
            symbol: Symbol::new(symbol),
            name: name.to_string(),
            price,
            change_percent,
        }
    }

    /// Nothing but the symbol was provided, e.g. a bare `"MSFT"` entry in a favorites list
    pub fn is_symbol_only(&self) -> bool {
        self.name.is_empty() && self.price.is_zero() && self.change_percent.is_zero()
    }

    /// Get display name, fallback to symbol if name is empty
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.symbol.as_str()
        } else {
            &self.name
        }
    }
}

/// The instrument currently shown in the stock view. Derived, never edited.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectedInstrument {
    pub symbol: Symbol,
    pub name: String,
    pub price: Decimal,
    pub change_percent: Decimal,
}

impl From<&Quote> for SelectedInstrument {
    fn from(quote: &Quote) -> Self {
        Self {
            symbol: quote.symbol.clone(),
            name: quote.name.clone(),
            price: quote.price,
            change_percent: quote.change_percent,
        }
    }
}

/// Fundamentals returned alongside a symbol detail quote
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub prev_close: Option<Decimal>,
    pub volume: Option<u64>,
    pub market_cap: Option<Decimal>,
    pub pe_ratio: Option<Decimal>,
    pub week52_high: Option<Decimal>,
    pub week52_low: Option<Decimal>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StockDetails {
    pub quote: Quote,
    pub fundamentals: Fundamentals,
}

/// One OHLCV bar of the price chart
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    pub time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

/// Chart bar interval
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
pub enum ChartInterval {
    #[strum(serialize = "5m")]
    FiveMinutes,
    #[strum(serialize = "1h")]
    Hour,
    #[default]
    #[strum(serialize = "1d")]
    Day,
    #[strum(serialize = "1w")]
    Week,
}

impl ChartInterval {
    /// Query parameter value sent to the backend
    pub fn as_param(self) -> &'static str {
        self.into()
    }

    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::FiveMinutes => Self::Hour,
            Self::Hour => Self::Day,
            Self::Day => Self::Week,
            Self::Week => Self::FiveMinutes,
        }
    }

    #[must_use]
    pub fn prev(self) -> Self {
        match self {
            Self::FiveMinutes => Self::Week,
            Self::Hour => Self::FiveMinutes,
            Self::Day => Self::Hour,
            Self::Week => Self::Day,
        }
    }
}

impl std::fmt::Display for ChartInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_param())
    }
}

/// Ranking used by the stock list endpoint
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum ListOption {
    #[default]
    Hot,
    Gainers,
    Losers,
    Active,
}

impl ListOption {
    pub fn as_param(self) -> &'static str {
        self.into()
    }

    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Hot => Self::Gainers,
            Self::Gainers => Self::Losers,
            Self::Losers => Self::Active,
            Self::Active => Self::Hot,
        }
    }
}

/// Buy or sell
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn path(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ChartInterval, ListOption, Quote, Symbol};
    use rust_decimal_macros::dec;

    #[test]
    fn symbol_is_normalized() {
        assert_eq!(Symbol::new("  googl "), Symbol::new("GOOGL"));
        assert_eq!(Symbol::new("brk.b").as_str(), "BRK.B");
        assert!(Symbol::new("   ").is_empty());
    }

    #[test]
    fn symbol_round_trips_as_plain_string() {
        let symbol: Symbol = serde_json::from_str("\"msft\"").expect("valid json");
        assert_eq!(symbol.as_str(), "MSFT");
        assert_eq!(serde_json::to_string(&symbol).expect("serialize"), "\"MSFT\"");
    }

    #[test]
    fn display_name_falls_back_to_symbol() {
        let quote = Quote::new("TSLA", "", dec!(1), dec!(0));
        assert_eq!(quote.display_name(), "TSLA");
    }

    #[test]
    fn chart_interval_cycles() {
        assert_eq!(ChartInterval::Week.next(), ChartInterval::FiveMinutes);
        assert_eq!(ChartInterval::FiveMinutes.prev(), ChartInterval::Week);
        assert_eq!(ChartInterval::Day.as_param(), "1d");
    }

    #[test]
    fn list_option_params_are_lowercase() {
        assert_eq!(ListOption::Hot.as_param(), "hot");
        assert_eq!(ListOption::Gainers.as_param(), "gainers");
    }
}
