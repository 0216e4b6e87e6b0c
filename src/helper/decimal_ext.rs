use rust_decimal::{Decimal, RoundingStrategy};

pub trait DecimalExt {
    /// Price with 2 decimals, 3 below 10
    fn format_price(&self) -> String;
    /// Signed percent; the value is already in percent units (`1.25` -> `+1.25%`)
    fn format_percent(&self) -> String;
    /// Money amount with thousands separators
    fn format_money(&self) -> String;
}

impl DecimalExt for Decimal {
    fn format_price(&self) -> String {
        if self.abs() < Decimal::TEN {
            format!("{self:.3}")
        } else {
            format!("{self:.2}")
        }
    }

    fn format_percent(&self) -> String {
        let value = self.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        if value.is_sign_negative() && !value.is_zero() {
            format!("{value:.2}%")
        } else {
            format!("+{:.2}%", value.abs())
        }
    }

    fn format_money(&self) -> String {
        let value = self.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let text = format!("{:.2}", value.abs());
        let (int, frac) = text.split_once('.').unwrap_or((&text, "00"));
        let mut grouped = String::with_capacity(int.len() + int.len() / 3);
        for (i, c) in int.chars().enumerate() {
            if i > 0 && (int.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }
        let sign = if value.is_sign_negative() && !value.is_zero() {
            "-"
        } else {
            ""
        };
        format!("{sign}{grouped}.{frac}")
    }
}
