use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use unicode_width::UnicodeWidthChar;

pub fn align_right(text: &str, width: usize) -> String {
    let extra: usize = text
        .chars()
        .filter_map(|c| c.width_cjk().and_then(|w| w.checked_sub(1)))
        .sum();
    format!(
        "{text:>width$}",
        width = width.checked_sub(extra).unwrap_or(width)
    )
}

/// Large amounts such as market cap: `2.93T` (en) / `2.93 万亿` (zh-CN)
pub fn unit(number: Decimal, precision: u32) -> String {
    let steps: [(Decimal, &str); 3] = if rust_i18n::locale().starts_with("zh") {
        [(dec!(1e12), " 万亿"), (dec!(1e8), " 亿"), (dec!(1e4), " 万")]
    } else {
        [(dec!(1e12), "T"), (dec!(1e9), "B"), (dec!(1e6), "M")]
    };
    steps
        .iter()
        .find(|(base, _)| number.abs() >= *base)
        .map_or_else(
            || format!("{}", number.round_dp(precision)),
            |(base, suffix)| format!("{}{suffix}", (number / base).round_dp(precision)),
        )
}

/// Unix seconds as `2024-01-05 14:30` in the local offset (UTC if unknown)
pub fn datetime(secs: i64) -> String {
    let offset = time::UtcOffset::current_local_offset().unwrap_or(time::UtcOffset::UTC);
    datetime_at(secs, offset)
}

fn datetime_at(secs: i64, offset: time::UtcOffset) -> String {
    let format = time::macros::format_description!("[year]-[month]-[day] [hour]:[minute]");
    time::OffsetDateTime::from_unix_timestamp(secs)
        .ok()
        .and_then(|t| t.to_offset(offset).format(format).ok())
        .unwrap_or_else(|| "--".to_string())
}
