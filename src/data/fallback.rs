use rust_decimal_macros::dec;

use super::Quote;

/// Static sample quotes shown before (or without) any backend data
pub static SAMPLE_QUOTES: std::sync::LazyLock<Vec<Quote>> = std::sync::LazyLock::new(|| {
    vec![
        Quote::new("AAPL", "Apple Inc.", dec!(189.84), dec!(0.62)),
        Quote::new("MSFT", "Microsoft Corporation", dec!(374.51), dec!(-0.28)),
        Quote::new("GOOGL", "Alphabet Inc.", dec!(138.21), dec!(1.04)),
        Quote::new("AMZN", "Amazon.com, Inc.", dec!(146.88), dec!(0.47)),
        Quote::new("NVDA", "NVIDIA Corporation", dec!(467.70), dec!(2.15)),
        Quote::new("TSLA", "Tesla, Inc.", dec!(238.45), dec!(-1.73)),
        Quote::new("META", "Meta Platforms, Inc.", dec!(325.28), dec!(0.91)),
        Quote::new("NFLX", "Netflix, Inc.", dec!(468.50), dec!(-0.35)),
    ]
});

pub fn sample_quotes() -> &'static [Quote] {
    &SAMPLE_QUOTES
}

#[cfg(test)]
mod tests {
    use super::sample_quotes;
    use std::collections::HashSet;

    #[test]
    fn sample_symbols_are_unique() {
        let symbols: HashSet<_> = sample_quotes().iter().map(|q| q.symbol.clone()).collect();
        assert_eq!(symbols.len(), sample_quotes().len());
    }
}
