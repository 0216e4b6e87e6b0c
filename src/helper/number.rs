use std::cmp::Ordering;

pub trait Sign {
    fn sign(&self) -> Ordering;
}

impl Sign for str {
    fn sign(&self) -> Ordering {
        if self.starts_with('-') {
            Ordering::Less
        } else if self.chars().all(|c| matches!(c, '0' | '.' | '+' | '%' | ',')) {
            Ordering::Equal
        } else {
            Ordering::Greater
        }
    }
}

impl Sign for rust_decimal::Decimal {
    fn sign(&self) -> Ordering {
        if self.is_zero() {
            Ordering::Equal
        } else if self.is_sign_negative() {
            Ordering::Less
        } else {
            Ordering::Greater
        }
    }
}

/// Short volume: `1234567` -> `1.23M` (en) / `123.46万` (zh-CN)
pub fn format_volume(volume: u64) -> String {
    const EN: [(u64, &str); 3] = [
        (1_000_000_000, "B"),
        (1_000_000, "M"),
        (1_000, "K"),
    ];
    const ZH: [(u64, &str); 3] = [
        (1_000_000_000_000, "万亿"),
        (100_000_000, "亿"),
        (10_000, "万"),
    ];

    if volume == 0 {
        return "--".to_string();
    }

    let units = if rust_i18n::locale().starts_with("zh") {
        &ZH
    } else {
        &EN
    };
    units
        .iter()
        .find(|(base, _)| volume >= *base)
        .map_or_else(
            || volume.to_string(),
            |(base, unit)| {
                #[allow(clippy::cast_precision_loss)]
                let scaled = volume as f64 / *base as f64;
                format!("{scaled:.2}{unit}")
            },
        )
}
