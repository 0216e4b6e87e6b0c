//! Favorites with optimistic toggles.
//!
//! A toggle is applied locally as a tentative change and written to the backend. A failed
//! write rolls the tentative change back; a successful one marks the list stale so it is
//! refetched, and writes still in flight are re-applied on top of whatever the backend returns.

use crate::api::Backend;
use crate::data::{Loadable, Quote, Session, Symbol, Versioned};
use crate::error::{AppError, FetchError};

/// Ordered set of quotes keyed by symbol
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FavoriteSet {
    items: Vec<Quote>,
}

impl FavoriteSet {
    pub fn from_quotes(quotes: impl IntoIterator<Item = Quote>) -> Self {
        let mut set = Self::default();
        for quote in quotes {
            set.insert(quote);
        }
        set
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.items.iter().any(|q| &q.symbol == symbol)
    }

    pub fn items(&self) -> &[Quote] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns `false` if the symbol was already present
    pub fn insert(&mut self, quote: Quote) -> bool {
        if self.contains(&quote.symbol) {
            return false;
        }
        self.items.push(quote);
        true
    }

    /// Removes the symbol, returning its position and record
    pub fn remove(&mut self, symbol: &Symbol) -> Option<(usize, Quote)> {
        let index = self.items.iter().position(|q| &q.symbol == symbol)?;
        Some((index, self.items.remove(index)))
    }

    fn remove_preview(&self, symbol: &Symbol) -> Option<(usize, Quote)> {
        let index = self.items.iter().position(|q| &q.symbol == symbol)?;
        Some((index, self.items[index].clone()))
    }

    fn restore(&mut self, index: usize, quote: Quote) {
        if !self.contains(&quote.symbol) {
            let index = index.min(self.items.len());
            self.items.insert(index, quote);
        }
    }
}

/// A tentative change waiting for its backend write
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FavoriteWrite {
    Add(Quote),
    Remove { index: usize, quote: Quote },
}

impl FavoriteWrite {
    pub fn symbol(&self) -> &Symbol {
        match self {
            Self::Add(quote) | Self::Remove { quote, .. } => &quote.symbol,
        }
    }

    pub fn is_add(&self) -> bool {
        matches!(self, Self::Add(_))
    }

    fn apply(&self, set: &mut FavoriteSet) {
        match self {
            Self::Add(quote) => {
                set.insert(quote.clone());
            }
            Self::Remove { quote, .. } => {
                set.remove(&quote.symbol);
            }
        }
    }

    fn revert(&self, set: &mut FavoriteSet) {
        match self {
            Self::Add(quote) => {
                set.remove(&quote.symbol);
            }
            Self::Remove { index, quote } => set.restore(*index, quote.clone()),
        }
    }
}

#[derive(Debug, Default)]
pub struct FavoritesManager {
    set: Versioned<FavoriteSet>,
    pending: Vec<FavoriteWrite>,
    status: Loadable<()>,
    fetch_seq: u64,
    stale: bool,
}

impl FavoritesManager {
    pub fn set(&self) -> &FavoriteSet {
        self.set.get()
    }

    pub fn revision(&self) -> u64 {
        self.set.revision()
    }

    pub fn status(&self) -> &Loadable<()> {
        &self.status
    }

    pub fn is_pending(&self, symbol: &Symbol) -> bool {
        self.pending.iter().any(|w| w.symbol() == symbol)
    }

    /// Drop everything; used when the session turns anonymous
    pub fn reset(&mut self) {
        self.set.set(FavoriteSet::default());
        self.pending.clear();
        self.status = Loadable::Idle;
        self.stale = false;
        // a fetch started for the previous session must not land
        self.fetch_seq += 1;
    }

    /// Apply a toggle tentatively.
    ///
    /// `Ok(None)` when a write for the same symbol is still in flight; the toggle is ignored.
    pub fn begin_toggle(
        &mut self,
        session: &Session,
        quote: &Quote,
    ) -> Result<Option<FavoriteWrite>, AppError> {
        if !session.is_authenticated() {
            return Err(AppError::AuthRequired);
        }
        if self.is_pending(&quote.symbol) {
            tracing::debug!(symbol = %quote.symbol, "favorite write already pending");
            return Ok(None);
        }

        let existing = self.set.get().remove_preview(&quote.symbol);
        let write = match existing {
            Some((index, quote)) => FavoriteWrite::Remove { index, quote },
            None => FavoriteWrite::Add(quote.clone()),
        };
        self.set.update(|set| write.apply(set));
        self.pending.push(write.clone());
        Ok(Some(write))
    }

    /// Settle a write: roll back on failure, otherwise mark the list for refetch
    pub fn settle(
        &mut self,
        write: &FavoriteWrite,
        result: Result<(), FetchError>,
    ) -> Result<(), AppError> {
        self.pending.retain(|w| w != write);
        match result {
            Ok(()) => {
                self.stale = true;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(symbol = %write.symbol(), error = %err, "favorite write failed");
                self.set.update(|set| write.revert(set));
                Err(AppError::from_write(err))
            }
        }
    }

    /// Refetch needed: never loaded or invalidated, and nothing in flight.
    /// A failed fetch waits for a manual refresh.
    pub fn needs_fetch(&self, session: &Session) -> bool {
        session.is_authenticated()
            && !self.status.is_loading()
            && (self.stale || matches!(self.status, Loadable::Idle))
    }

    /// Force a refetch on the next refresh pass
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    pub fn begin_fetch(&mut self) -> u64 {
        self.fetch_seq += 1;
        self.stale = false;
        self.status = Loadable::Loading;
        self.fetch_seq
    }

    /// Replace the local set with backend truth, then re-apply writes still in flight.
    /// Results of an older fetch are ignored.
    pub fn apply_fetch(&mut self, seq: u64, result: Result<Vec<Quote>, FetchError>) {
        if seq != self.fetch_seq {
            return;
        }
        match result {
            Ok(quotes) => {
                let mut set = FavoriteSet::from_quotes(quotes);
                for write in &self.pending {
                    write.apply(&mut set);
                }
                self.set.set(set);
                self.status = Loadable::Ready(());
            }
            Err(err) => {
                self.status = Loadable::Failed(err.to_string());
            }
        }
    }

    /// Full toggle round trip against the backend: write, settle, refetch
    pub async fn toggle(
        &mut self,
        backend: &dyn Backend,
        session: &Session,
        quote: &Quote,
    ) -> Result<(), AppError> {
        let Some(write) = self.begin_toggle(session, quote)? else {
            return Ok(());
        };
        let result = persist(backend, &write).await;
        self.settle(&write, result)?;
        let seq = self.begin_fetch();
        let fetched = backend.favorites().await;
        self.apply_fetch(seq, fetched);
        Ok(())
    }
}

/// Write one tentative change to the backend
pub async fn persist(backend: &dyn Backend, write: &FavoriteWrite) -> Result<(), FetchError> {
    tracing::info!(symbol = %write.symbol(), add = write.is_add(), "persist favorite");
    match write {
        FavoriteWrite::Add(quote) => backend.add_favorite(&quote.symbol).await,
        FavoriteWrite::Remove { quote, .. } => backend.remove_favorite(&quote.symbol).await,
    }
}

#[cfg(test)]
mod tests {
    use super::{persist, FavoriteSet, FavoritesManager};
    use crate::data::{Loadable, Quote, Session, Symbol, User};
    use crate::error::{AppError, FetchError};
    use crate::testkit::FakeBackend;
    use rust_decimal_macros::dec;

    fn session() -> Session {
        Session::Authenticated(User {
            id: "1".to_string(),
            username: "trader".to_string(),
            email: None,
        })
    }

    fn quote(symbol: &str) -> Quote {
        Quote::new(symbol, symbol, dec!(10), dec!(0))
    }

    fn symbols(manager: &FavoritesManager) -> Vec<String> {
        manager
            .set()
            .items()
            .iter()
            .map(|q| q.symbol.to_string())
            .collect()
    }

    async fn loaded(backend: &FakeBackend) -> FavoritesManager {
        let mut manager = FavoritesManager::default();
        let seq = manager.begin_fetch();
        manager.apply_fetch(seq, crate::api::Backend::favorites(backend).await);
        manager
    }

    #[test]
    fn anonymous_toggle_requires_login() {
        let mut manager = FavoritesManager::default();
        let before = manager.set().clone();
        let result = manager.begin_toggle(&Session::Anonymous, &quote("MSFT"));
        assert_eq!(result, Err(AppError::AuthRequired));
        assert_eq!(manager.set(), &before);
        assert_eq!(manager.revision(), 0);
    }

    #[tokio::test]
    async fn anonymous_msft_toggle_leaves_backend_alone() {
        let backend = FakeBackend::default();
        let mut manager = FavoritesManager::default();
        let result = manager
            .toggle(&backend, &Session::Anonymous, &quote("MSFT"))
            .await;
        assert_eq!(result, Err(AppError::AuthRequired));
        assert!(manager.set().is_empty());
        assert!(backend.favorite_writes().is_empty());
    }

    #[tokio::test]
    async fn double_toggle_restores_membership() {
        let backend = FakeBackend::default().favorites_list(vec![quote("AAPL"), quote("TSLA")]);
        let mut manager = loaded(&backend).await;
        let before = symbols(&manager);

        for symbol in ["AAPL", "NVDA"] {
            manager
                .toggle(&backend, &session(), &quote(symbol))
                .await
                .expect("first toggle");
            manager
                .toggle(&backend, &session(), &quote(symbol))
                .await
                .expect("second toggle");
            let mut after = symbols(&manager);
            let mut expected = before.clone();
            after.sort();
            expected.sort();
            assert_eq!(after, expected, "toggling {symbol} twice");
        }
        assert_eq!(backend.favorite_writes().len(), 4);
    }

    #[tokio::test]
    async fn failed_write_rolls_back() {
        let backend = FakeBackend::default()
            .favorites_list(vec![quote("AAPL")])
            .failing_favorite_writes(FetchError::Rejected("db down".to_string()));
        let mut manager = loaded(&backend).await;

        let result = manager.toggle(&backend, &session(), &quote("AAPL")).await;
        assert!(matches!(result, Err(AppError::Persistence(_))));
        assert_eq!(symbols(&manager), vec!["AAPL"]);

        let result = manager.toggle(&backend, &session(), &quote("MSFT")).await;
        assert!(matches!(result, Err(AppError::Persistence(_))));
        assert_eq!(symbols(&manager), vec!["AAPL"]);
    }

    #[tokio::test]
    async fn expired_session_is_auth_required() {
        let backend = FakeBackend::default().failing_favorite_writes(FetchError::Status {
            status: 401,
            message: None,
        });
        let mut manager = FavoritesManager::default();
        let result = manager.toggle(&backend, &session(), &quote("MSFT")).await;
        assert_eq!(result, Err(AppError::AuthRequired));
        assert!(manager.set().is_empty());
    }

    #[tokio::test]
    async fn success_refetches_backend_truth() {
        let backend = FakeBackend::default().favorites_list(vec![quote("AAPL")]);
        let mut manager = loaded(&backend).await;
        assert_eq!(backend.favorites_calls(), 1);

        manager
            .toggle(&backend, &session(), &quote("MSFT"))
            .await
            .expect("toggle");
        assert_eq!(backend.favorites_calls(), 2);
        assert_eq!(symbols(&manager), vec!["AAPL", "MSFT"]);
        assert_eq!(manager.status(), &Loadable::Ready(()));
    }

    #[tokio::test]
    async fn pending_write_survives_refetch() {
        let backend = FakeBackend::default().favorites_list(vec![quote("AAPL")]);
        let mut manager = loaded(&backend).await;

        let write = manager
            .begin_toggle(&session(), &quote("NVDA"))
            .expect("authenticated")
            .expect("not pending");
        assert!(manager.set().contains(&Symbol::new("NVDA")));

        // a second toggle while the write is in flight is ignored
        assert_eq!(manager.begin_toggle(&session(), &quote("NVDA")), Ok(None));

        // a refetch that raced the write still shows the tentative add
        let seq = manager.begin_fetch();
        manager.apply_fetch(seq, Ok(vec![quote("AAPL")]));
        assert_eq!(symbols(&manager), vec!["AAPL", "NVDA"]);

        manager
            .settle(&write, persist(&backend, &write).await)
            .expect("persisted");
        assert!(manager.needs_fetch(&session()));
    }

    #[test]
    fn stale_fetch_is_ignored() {
        let mut manager = FavoritesManager::default();
        let old = manager.begin_fetch();
        let new = manager.begin_fetch();
        manager.apply_fetch(new, Ok(vec![quote("AAPL")]));
        manager.apply_fetch(old, Ok(vec![]));
        assert_eq!(symbols(&manager), vec!["AAPL"]);
    }

    #[test]
    fn fetch_from_before_reset_is_ignored() {
        let mut manager = FavoritesManager::default();
        let old = manager.begin_fetch();
        manager.reset();
        manager.apply_fetch(old, Ok(vec![quote("AAPL")]));
        assert!(manager.set().is_empty());
        assert_eq!(manager.status(), &Loadable::Idle);
    }

    #[test]
    fn removal_rollback_keeps_position() {
        let mut set = FavoriteSet::from_quotes([quote("A"), quote("B"), quote("C")]);
        let (index, removed) = set.remove(&Symbol::new("B")).expect("present");
        set.restore(index, removed);
        let order: Vec<_> = set.items().iter().map(|q| q.symbol.to_string()).collect();
        assert_eq!(order, vec!["A", "B", "C"]);
    }
}
