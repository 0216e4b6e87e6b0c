//! Normalisation of the backend's heterogeneous quote payloads.
//!
//! Search, list, favorites and detail endpoints do not agree on field names; every
//! shape is folded into [`Quote`] here so nothing downstream sees wire records.

use rust_decimal::Decimal;
use serde_json::Value;

use super::envelope::list_items;
use super::record::Record;
use crate::data::{Candle, Fundamentals, Quote, StockDetails, Symbol};
use crate::error::FetchError;

const SYMBOL: &[&str] = &["symbol", "ticker", "code"];
const NAME: &[&str] = &["name", "shortName", "companyName", "longName"];
const PRICE: &[&str] = &["price", "currentPrice", "lastPrice", "regularMarketPrice"];
const CHANGE_PERCENT: &[&str] = &[
    "changePercent",
    "change_percent",
    "percentChange",
    "regularMarketChangePercent",
];

/// One quote from a loose record. Records without a symbol are not quotes.
pub fn quote_from_value(value: &Value) -> Option<Quote> {
    if let Value::String(symbol) = value {
        let symbol = Symbol::new(symbol);
        return (!symbol.is_empty()).then(|| Quote {
            symbol,
            ..Quote::default()
        });
    }

    let record = Record::new(value)?;
    let symbol = Symbol::new(&record.text(SYMBOL)?);
    if symbol.is_empty() {
        return None;
    }
    Some(quote_with_symbol(record, symbol))
}

fn quote_with_symbol(record: Record<'_>, symbol: Symbol) -> Quote {
    Quote {
        symbol,
        name: record.text(NAME).unwrap_or_default(),
        price: record.decimal(PRICE).unwrap_or_default(),
        change_percent: record.decimal(CHANGE_PERCENT).unwrap_or_default(),
    }
}

/// Quotes from a list payload, keeping the first record of a duplicated symbol
pub fn quotes_from_list(data: Value) -> Vec<Quote> {
    let mut quotes: Vec<Quote> = vec![];
    for item in list_items(data) {
        let Some(quote) = quote_from_value(&item) else {
            tracing::debug!(record = %item, "skip record without symbol");
            continue;
        };
        if !quotes.iter().any(|q| q.symbol == quote.symbol) {
            quotes.push(quote);
        }
    }
    quotes
}

/// Detail payload: either a flat record or `{ quote, fundamentals }`
pub fn details_from_value(symbol: &Symbol, data: &Value) -> Result<StockDetails, FetchError> {
    let record = Record::new(data)
        .ok_or_else(|| FetchError::Decode(format!("expected an object for {symbol}")))?;
    let quote_record = record.child(&["quote", "stock"]).unwrap_or(record);
    // Some backends omit the symbol on the detail route
    let symbol = quote_record
        .text(SYMBOL)
        .or_else(|| record.text(SYMBOL))
        .map(|s| Symbol::new(&s))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| symbol.clone());
    let quote = quote_with_symbol(quote_record, symbol);

    let fundamentals =
        fundamentals_from(record.child(&["fundamentals", "stats"]).unwrap_or(record));
    Ok(StockDetails { quote, fundamentals })
}

fn fundamentals_from(record: Record<'_>) -> Fundamentals {
    Fundamentals {
        open: record.decimal(&["open", "regularMarketOpen"]),
        high: record.decimal(&["high", "dayHigh", "regularMarketDayHigh"]),
        low: record.decimal(&["low", "dayLow", "regularMarketDayLow"]),
        prev_close: record.decimal(&[
            "previousClose",
            "prevClose",
            "prev_close",
            "regularMarketPreviousClose",
        ]),
        volume: record.integer(&["volume", "regularMarketVolume"]),
        market_cap: record.decimal(&["marketCap", "market_cap"]),
        pe_ratio: record.decimal(&["peRatio", "pe_ratio", "pe", "trailingPE"]),
        week52_high: record.decimal(&["fiftyTwoWeekHigh", "week52High", "high52"]),
        week52_low: record.decimal(&["fiftyTwoWeekLow", "week52Low", "low52"]),
    }
}

/// OHLCV bars, oldest first. Bars missing a close price are dropped.
pub fn candles_from_list(data: Value) -> Vec<Candle> {
    let data = match data {
        Value::Object(mut map) => ["candles", "bars"]
            .iter()
            .find_map(|key| map.remove(*key))
            .unwrap_or(Value::Object(map)),
        other => other,
    };

    let mut candles: Vec<Candle> = list_items(data)
        .iter()
        .filter_map(|item| {
            let record = Record::new(item)?;
            let close = record.decimal(&["close", "c"])?;
            Some(Candle {
                time: record
                    .timestamp(&["time", "timestamp", "t", "date"])
                    .unwrap_or_default(),
                open: record.decimal(&["open", "o"]).unwrap_or(close),
                high: record.decimal(&["high", "h"]).unwrap_or(close),
                low: record.decimal(&["low", "l"]).unwrap_or(close),
                close,
                volume: record.integer(&["volume", "v"]).unwrap_or_default(),
            })
        })
        .collect();
    candles.sort_by_key(|c| c.time);
    candles
}

/// Close prices for the sparkline
pub fn closes(candles: &[Candle]) -> Vec<Decimal> {
    candles.iter().map(|c| c.close).collect()
}
