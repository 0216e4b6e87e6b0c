use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Symbol, TradeSide};

/// Identity returned by `whoami`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
}

/// Whether the current session can perform account actions
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated(User),
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            Self::Anonymous => None,
        }
    }
}

/// Cash balance snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub balance: Decimal,
    pub currency: String,
}

/// Stock holding information
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: Symbol,
    pub name: String,
    pub quantity: Decimal,
    pub avg_cost: Decimal,
    pub current_price: Decimal,
    pub market_value: Decimal,
    pub pnl: Decimal,
    /// Percent units
    pub pnl_percent: Decimal,
}

/// Portfolio overview as computed by the backend
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portfolio {
    pub total_value: Decimal,
    pub cash: Decimal,
    pub market_value: Decimal,
    pub total_pnl: Decimal,
    /// Percent units
    pub total_pnl_percent: Decimal,
    pub holdings: Vec<Holding>,
}

/// One executed trade from the history endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: String,
    pub symbol: Symbol,
    pub side: TradeSide,
    pub quantity: u32,
    pub price: Decimal,
    pub fee: Decimal,
    pub total: Decimal,
    /// Unix seconds
    pub executed_at: i64,
}

/// Backend acknowledgement of a submitted trade
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeReceipt {
    pub id: Option<String>,
    pub symbol: Symbol,
    pub side: TradeSide,
    pub quantity: u32,
    pub price: Decimal,
    pub total: Option<Decimal>,
}
