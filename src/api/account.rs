use serde_json::Value;

use super::envelope::list_items;
use super::record::Record;
use crate::data::{Holding, Portfolio, Symbol, TradeReceipt, TradeRecord, TradeSide, User, Wallet};
use crate::error::FetchError;
use crate::trade::TradeIntent;

fn object<'a>(what: &str, data: &'a Value) -> Result<Record<'a>, FetchError> {
    Record::new(data).ok_or_else(|| FetchError::Decode(format!("expected {what} object")))
}

/// `whoami` payload, possibly wrapped in `user`
pub fn user_from_value(data: &Value) -> Result<User, FetchError> {
    let record = object("user", data)?;
    let record = record.child(&["user"]).unwrap_or(record);
    let username = record
        .text(&["username", "name", "email"])
        .ok_or_else(|| FetchError::Decode("user without a name".to_string()))?;
    Ok(User {
        id: record.text(&["id", "userId", "_id"]).unwrap_or_default(),
        username,
        email: record.text(&["email"]),
    })
}

pub fn wallet_from_value(data: &Value) -> Result<Wallet, FetchError> {
    let record = object("wallet", data)?;
    let record = record.child(&["wallet"]).unwrap_or(record);
    let balance = record
        .decimal(&["balance", "cash", "available", "amount"])
        .ok_or_else(|| FetchError::Decode("wallet without a balance".to_string()))?;
    Ok(Wallet {
        balance,
        currency: record.text(&["currency"]).unwrap_or_else(|| "USD".to_string()),
    })
}

fn holding_from(record: Record<'_>) -> Option<Holding> {
    let symbol = Symbol::new(&record.text(&["symbol", "ticker", "code"])?);
    if symbol.is_empty() {
        return None;
    }
    Some(Holding {
        name: record
            .text(&["name", "shortName", "companyName"])
            .unwrap_or_default(),
        quantity: record
            .decimal(&["quantity", "shares", "qty"])
            .unwrap_or_default(),
        avg_cost: record
            .decimal(&["avgCost", "averageCost", "avg_price", "avgPrice", "costBasis"])
            .unwrap_or_default(),
        current_price: record
            .decimal(&["currentPrice", "price", "lastPrice"])
            .unwrap_or_default(),
        market_value: record
            .decimal(&["marketValue", "market_value", "value"])
            .unwrap_or_default(),
        pnl: record
            .decimal(&["pnl", "profit", "unrealizedPnl", "gain"])
            .unwrap_or_default(),
        pnl_percent: record
            .decimal(&["pnlPercent", "profitPercent", "returnRate", "gainPercent"])
            .unwrap_or_default(),
        symbol,
    })
}

/// Portfolio snapshot. Percent fields are taken as percent units.
pub fn portfolio_from_value(data: &Value) -> Result<Portfolio, FetchError> {
    let record = object("portfolio", data)?;
    let holdings = record
        .get(&["holdings", "positions", "stocks"])
        .cloned()
        .map(list_items)
        .unwrap_or_default()
        .iter()
        .filter_map(Record::new)
        .filter_map(holding_from)
        .collect();

    Ok(Portfolio {
        total_value: record
            .decimal(&["totalValue", "total_value", "totalAssets"])
            .unwrap_or_default(),
        cash: record
            .decimal(&["cash", "balance", "availableCash"])
            .unwrap_or_default(),
        market_value: record
            .decimal(&["marketValue", "market_value", "stockValue"])
            .unwrap_or_default(),
        total_pnl: record
            .decimal(&["totalPnl", "total_pnl", "totalProfit", "pnl"])
            .unwrap_or_default(),
        total_pnl_percent: record
            .decimal(&["totalPnlPercent", "total_pnl_percent", "returnRate", "pnlPercent"])
            .unwrap_or_default(),
        holdings,
    })
}

fn side_from(record: Record<'_>) -> Option<TradeSide> {
    match record.text(&["side", "type", "action"])?.to_ascii_lowercase().as_str() {
        "buy" => Some(TradeSide::Buy),
        "sell" => Some(TradeSide::Sell),
        _ => None,
    }
}

/// Trade history, newest first. Records with an unknown side are dropped.
pub fn history_from_list(data: Value) -> Vec<TradeRecord> {
    let mut records: Vec<TradeRecord> = list_items(data)
        .iter()
        .filter_map(|item| {
            let record = Record::new(item)?;
            let symbol = Symbol::new(&record.text(&["symbol", "ticker", "code"])?);
            let side = side_from(record)?;
            let quantity = record.integer(&["quantity", "shares", "qty"])?;
            let price = record.decimal(&["price", "executedPrice"]).unwrap_or_default();
            let fee = record
                .decimal(&["fee", "commission"])
                .unwrap_or_default();
            Some(TradeRecord {
                id: record.text(&["id", "tradeId", "_id"]).unwrap_or_default(),
                symbol,
                side,
                quantity: u32::try_from(quantity).ok()?,
                price,
                fee,
                total: record
                    .decimal(&["total", "amount", "totalAmount"])
                    .unwrap_or_else(|| price * rust_decimal::Decimal::from(quantity) + fee),
                executed_at: record
                    .timestamp(&["executedAt", "createdAt", "timestamp", "time"])
                    .unwrap_or_default(),
            })
        })
        .collect();
    records.sort_by(|a, b| b.executed_at.cmp(&a.executed_at));
    records
}

/// Acknowledgement of a trade; missing fields are filled from the submitted intent
pub fn receipt_from_value(intent: &TradeIntent, data: &Value) -> TradeReceipt {
    let record = Record::new(data).map(|r| r.child(&["trade", "order"]).unwrap_or(r));
    TradeReceipt {
        id: record.and_then(|r| r.text(&["id", "tradeId", "orderId", "_id"])),
        symbol: intent.symbol.clone(),
        side: intent.side,
        quantity: intent.quantity,
        price: record
            .and_then(|r| r.decimal(&["price", "executedPrice"]))
            .unwrap_or(intent.price),
        total: record.and_then(|r| r.decimal(&["total", "amount", "totalAmount"])),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        history_from_list, portfolio_from_value, receipt_from_value, user_from_value,
        wallet_from_value,
    };
    use crate::data::{Symbol, TradeSide};
    use crate::trade::TradeIntent;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn user_may_be_wrapped() {
        let user = user_from_value(&json!({"user": {"id": 7, "username": "trader"}})).expect("user");
        assert_eq!(user.id, "7");
        assert_eq!(user.username, "trader");
        assert_eq!(user.email, None);
    }

    #[test]
    fn wallet_requires_balance() {
        let wallet = wallet_from_value(&json!({"balance": "100000.00"})).expect("wallet");
        assert_eq!(wallet.balance, dec!(100000.00));
        assert_eq!(wallet.currency, "USD");
        assert!(wallet_from_value(&json!({"currency": "USD"})).is_err());
    }

    #[test]
    fn portfolio_holdings_are_normalized() {
        let portfolio = portfolio_from_value(&json!({
            "totalValue": 101_234.5,
            "cash": 99_000,
            "positions": [
                {"symbol": "aapl", "shares": 10, "avgPrice": "180", "price": 189.84, "returnRate": 5.47},
                {"name": "missing symbol"},
            ],
        }))
        .expect("portfolio");
        assert_eq!(portfolio.holdings.len(), 1);
        let holding = &portfolio.holdings[0];
        assert_eq!(holding.symbol.as_str(), "AAPL");
        assert_eq!(holding.quantity, dec!(10));
        assert_eq!(holding.avg_cost, dec!(180));
        assert_eq!(holding.pnl_percent, dec!(5.47));
        assert_eq!(portfolio.market_value, dec!(0));
    }

    #[test]
    fn history_is_newest_first() {
        let records = history_from_list(json!({"items": [
            {"id": "a", "symbol": "MSFT", "type": "BUY", "quantity": 2, "price": 10, "fee": 0.05, "createdAt": 100},
            {"id": "b", "symbol": "MSFT", "side": "sell", "quantity": 1, "price": 12, "createdAt": 200},
            {"id": "c", "symbol": "MSFT", "side": "short", "quantity": 1, "price": 12},
        ]}));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "b");
        assert_eq!(records[0].side, TradeSide::Sell);
        assert_eq!(records[1].total, dec!(20.05));
    }

    #[test]
    fn receipt_falls_back_to_intent() {
        let intent = TradeIntent::new(Symbol::new("NVDA"), TradeSide::Buy, 2, dec!(467.70))
            .expect("intent");
        let receipt = receipt_from_value(&intent, &json!(null));
        assert_eq!(receipt.price, dec!(467.70));
        assert_eq!(receipt.quantity, 2);
        assert_eq!(receipt.id, None);

        let receipt = receipt_from_value(&intent, &json!({"trade": {"id": "t1", "price": 467.5}}));
        assert_eq!(receipt.id.as_deref(), Some("t1"));
        assert_eq!(receipt.price, dec!(467.5));
    }
}
