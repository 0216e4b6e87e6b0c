use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Read-only view over one loosely-typed backend object.
///
/// Field lookups take a list of accepted spellings; the first present, non-null one wins.
#[derive(Clone, Copy)]
pub struct Record<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> Record<'a> {
    pub fn new(value: &'a Value) -> Option<Self> {
        value.as_object().map(|map| Self { map })
    }

    pub fn get(&self, keys: &[&str]) -> Option<&'a Value> {
        keys.iter()
            .filter_map(|key| self.map.get(*key))
            .find(|value| !value.is_null())
    }

    /// Nested object under one of `keys`
    pub fn child(&self, keys: &[&str]) -> Option<Record<'a>> {
        self.get(keys).and_then(Record::new)
    }

    pub fn text(&self, keys: &[&str]) -> Option<String> {
        let text = match self.get(keys)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    }

    pub fn decimal(&self, keys: &[&str]) -> Option<Decimal> {
        self.get(keys).and_then(decimal_value)
    }

    pub fn integer(&self, keys: &[&str]) -> Option<u64> {
        let value = self.decimal(keys)?;
        if value.is_sign_negative() || !value.fract().is_zero() {
            return None;
        }
        value.to_u64()
    }

    /// Unix seconds; accepts seconds, milliseconds or an RFC 3339 string
    pub fn timestamp(&self, keys: &[&str]) -> Option<i64> {
        match self.get(keys)? {
            Value::String(s) => match OffsetDateTime::parse(s.trim(), &Rfc3339) {
                Ok(at) => Some(at.unix_timestamp()),
                Err(_) => s.trim().parse::<i64>().ok().map(normalize_epoch),
            },
            Value::Number(n) => n.as_i64().map(normalize_epoch),
            _ => None,
        }
    }
}

/// Number or numeric string; `"1,234.5"` and `"1.25%"` are accepted
pub fn decimal_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let repr = n.to_string();
            Decimal::from_str(&repr)
                .or_else(|_| Decimal::from_scientific(&repr))
                .ok()
        }
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .trim_end_matches('%')
                .chars()
                .filter(|c| *c != ',')
                .collect();
            if cleaned.is_empty() {
                return None;
            }
            Decimal::from_str(&cleaned)
                .or_else(|_| Decimal::from_scientific(&cleaned))
                .ok()
        }
        _ => None,
    }
}

fn normalize_epoch(value: i64) -> i64 {
    // Anything past year 5138 in seconds is a millisecond timestamp
    if value > 99_999_999_999 {
        value / 1000
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::{decimal_value, Record};
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn first_present_alias_wins() {
        let value = json!({"ticker": null, "code": "aapl", "symbol": "MSFT"});
        let record = Record::new(&value).expect("object");
        assert_eq!(record.text(&["ticker", "code", "symbol"]), Some("aapl".to_string()));
    }

    #[test]
    fn numbers_may_be_strings() {
        assert_eq!(decimal_value(&json!("142.65")), Some(dec!(142.65)));
        assert_eq!(decimal_value(&json!(142.65)), Some(dec!(142.65)));
        assert_eq!(decimal_value(&json!("-1.25%")), Some(dec!(-1.25)));
        assert_eq!(decimal_value(&json!("2,500")), Some(dec!(2500)));
        assert_eq!(decimal_value(&json!("n/a")), None);
        assert_eq!(decimal_value(&json!(true)), None);
    }

    #[test]
    fn integer_rejects_fractions() {
        let value = json!({"volume": "1200", "shares": 1.5});
        let record = Record::new(&value).expect("object");
        assert_eq!(record.integer(&["volume"]), Some(1200));
        assert_eq!(record.integer(&["shares"]), None);
    }

    #[test]
    fn timestamps_accept_several_forms() {
        let value = json!({
            "a": 1_700_000_000,
            "b": 1_700_000_000_000_i64,
            "c": "2023-11-14T22:13:20Z",
        });
        let record = Record::new(&value).expect("object");
        assert_eq!(record.timestamp(&["a"]), Some(1_700_000_000));
        assert_eq!(record.timestamp(&["b"]), Some(1_700_000_000));
        assert_eq!(record.timestamp(&["c"]), Some(1_700_000_000));
    }
}
