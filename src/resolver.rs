//! Chooses which record supplies the instrument shown in the stock view.

use crate::data::{Quote, SelectedInstrument, Symbol};

/// Candidate records, in priority order
#[derive(Clone, Copy, Debug, Default)]
pub struct Sources<'a> {
    /// Records the user picked from search results, most recent first
    pub search: &'a [Quote],
    pub favorites: &'a [Quote],
    /// Most recently fetched hot list
    pub hot_list: &'a [Quote],
    pub fallback: &'a [Quote],
}

/// Content revisions of the non-static sources
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Revisions {
    pub search: u64,
    pub favorites: u64,
    pub hot_list: u64,
}

/// Symbol-only records carry no price and never supply the instrument
fn find<'a>(records: &'a [Quote], symbol: &Symbol) -> Option<&'a Quote> {
    records
        .iter()
        .find(|q| &q.symbol == symbol && !q.is_symbol_only())
}

/// First match wins: search pick, favorite, hot list, fallback sample, then `previous` as is
pub fn resolve(
    symbol: &Symbol,
    sources: &Sources<'_>,
    previous: Option<&SelectedInstrument>,
) -> Option<SelectedInstrument> {
    find(sources.search, symbol)
        .or_else(|| find(sources.favorites, symbol))
        .or_else(|| find(sources.hot_list, symbol))
        .or_else(|| find(sources.fallback, symbol))
        .map(SelectedInstrument::from)
        .or_else(|| previous.cloned())
}

/// Memoised [`resolve`]: recomputes only when the symbol or a source revision moves
#[derive(Debug, Default)]
pub struct SelectionResolver {
    key: Option<(Symbol, Revisions)>,
    current: Option<SelectedInstrument>,
    resolutions: u64,
}

impl SelectionResolver {
    pub fn current(&self) -> Option<&SelectedInstrument> {
        self.current.as_ref()
    }

    /// Number of times the resolver actually ran
    pub fn resolutions(&self) -> u64 {
        self.resolutions
    }

    /// Returns `true` if the selected instrument changed
    pub fn update(&mut self, symbol: &Symbol, revisions: Revisions, sources: &Sources<'_>) -> bool {
        if self
            .key
            .as_ref()
            .is_some_and(|(s, r)| s == symbol && *r == revisions)
        {
            return false;
        }

        self.key = Some((symbol.clone(), revisions));
        self.resolutions += 1;
        let next = resolve(symbol, sources, self.current.as_ref());
        if next == self.current {
            return false;
        }
        tracing::debug!(%symbol, price = ?next.as_ref().map(|s| s.price), "selected instrument");
        self.current = next;
        true
    }
}
