//! Debounced backend search.
//!
//! Input goes through a `watch` channel; a query is sent only after it has been stable for
//! [`QUIESCENCE`] and is at least [`MIN_QUERY_LEN`] characters long. Every settled query gets
//! a sequence number and only the newest one may update the results.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::api::Api;
use crate::data::{Loadable, Quote};
use crate::error::FetchError;

pub const QUIESCENCE: Duration = Duration::from_millis(300);
pub const MIN_QUERY_LEN: usize = 2;
pub const RESULT_LIMIT: usize = 20;

#[derive(Debug)]
pub enum SearchEvent {
    /// A request for `query` has been issued
    Pending { seq: u64, query: String },
    /// Query too short; results cleared without a request
    Cleared { seq: u64 },
    Settled {
        seq: u64,
        query: String,
        result: Result<Vec<Quote>, FetchError>,
    },
}

/// Owns the debounce task; dropping it ends the task
pub struct SearchDebouncer {
    tx: watch::Sender<String>,
}

impl SearchDebouncer {
    pub fn spawn(api: Api, emit: impl Fn(SearchEvent) + Send + Sync + 'static) -> Self {
        let (tx, mut rx) = watch::channel(String::new());
        let emit = Arc::new(emit);
        tokio::spawn(async move {
            let mut seq = 0;
            loop {
                if rx.changed().await.is_err() {
                    return;
                }
                // restart the window on every change
                loop {
                    match tokio::time::timeout(QUIESCENCE, rx.changed()).await {
                        Ok(Ok(())) => {}
                        Ok(Err(_)) => return,
                        Err(_) => break,
                    }
                }

                let query = rx.borrow_and_update().trim().to_string();
                seq += 1;
                if query.chars().count() < MIN_QUERY_LEN {
                    emit(SearchEvent::Cleared { seq });
                    continue;
                }

                emit(SearchEvent::Pending {
                    seq,
                    query: query.clone(),
                });
                tokio::spawn({
                    let api = api.clone();
                    let emit = emit.clone();
                    async move {
                        tracing::debug!(seq, query, "search");
                        let result = api.search(&query, RESULT_LIMIT).await;
                        emit(SearchEvent::Settled { seq, query, result });
                    }
                });
            }
        });
        Self { tx }
    }

    /// Feed the current input value
    pub fn input(&self, query: &str) {
        self.tx.send_if_modified(|current| {
            if current == query {
                return false;
            }
            query.clone_into(current);
            true
        });
    }
}

/// Results of the newest settled query
#[derive(Debug, Default)]
pub struct SearchResults {
    latest: u64,
    query: String,
    state: Loadable<Vec<Quote>>,
}

impl SearchResults {
    pub fn state(&self) -> &Loadable<Vec<Quote>> {
        &self.state
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn items(&self) -> &[Quote] {
        self.state.items()
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.state = Loadable::Idle;
    }

    /// Apply an event; returns `false` if it belonged to a superseded query
    pub fn apply(&mut self, event: SearchEvent) -> bool {
        match event {
            SearchEvent::Pending { seq, query } if seq > self.latest => {
                self.latest = seq;
                self.query = query;
                self.state = Loadable::Loading;
                true
            }
            SearchEvent::Cleared { seq } if seq > self.latest => {
                self.latest = seq;
                self.clear();
                true
            }
            SearchEvent::Settled { seq, query, result } if seq >= self.latest => {
                self.latest = seq;
                self.query = query;
                self.state = Loadable::from_list(result);
                true
            }
            event => {
                tracing::debug!(?event, latest = self.latest, "drop superseded search event");
                false
            }
        }
    }
}
