//! Shared UI state.
//!
//! [`Dashboard`] lives in the ECS world as a resource and is only touched by the main loop.
//! Fetches follow a `begin_*` / `apply_*` pair: `begin` marks the slot loading and hands out
//! the key the result must carry, `apply` drops results whose key is no longer current.

use bevy_ecs::prelude::Resource;

use crate::data::{
    sample_quotes, Cached, Candle, ChartInterval, ListOption, Loadable, Portfolio, Quote,
    SelectedInstrument, Session, StockDetails, Symbol, TradeRecord, TradeSide, Versioned, Wallet,
};
use crate::error::{AppError, FetchError, ValidationError};
use crate::favorites::{FavoriteWrite, FavoritesManager};
use crate::resolver::{Revisions, SelectionResolver, Sources};
use crate::search::SearchResults;
use crate::trade::{Settlement, Submission, TradeFlow};

/// Search picks remembered for the resolver
pub const MAX_PICKS: usize = 20;

/// Message shown in the notice popup
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    LoginRequired,
    Info(String),
    Error(String),
}

impl From<AppError> for Notice {
    fn from(err: AppError) -> Self {
        match err {
            AppError::AuthRequired => Self::LoginRequired,
            err => Self::Error(err.to_string()),
        }
    }
}

#[derive(Resource, Default)]
pub struct Dashboard {
    session: Session,
    list_option: ListOption,
    hot: Cached<Vec<Quote>>,
    /// Records of the last successful hot-list fetch; survives a failed refresh
    hot_records: Versioned<Vec<Quote>>,
    favorites: FavoritesManager,
    /// Search results the user opened, most recent first
    picks: Versioned<Vec<Quote>>,
    symbol: Option<Symbol>,
    resolver: SelectionResolver,
    details: Loadable<StockDetails>,
    details_for: Option<Symbol>,
    interval: ChartInterval,
    chart: Loadable<Vec<Candle>>,
    chart_for: Option<(Symbol, ChartInterval)>,
    wallet: Cached<Wallet>,
    portfolio: Cached<Portfolio>,
    history: Cached<Vec<TradeRecord>>,
    trade: TradeFlow,
    search: SearchResults,
    notice: Option<Notice>,
}

impl Dashboard {
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Identity changed. Anonymous sessions drop every backend-owned copy.
    pub fn set_session(&mut self, session: Session) {
        if session == self.session {
            return;
        }
        tracing::info!(
            user = session.user().map(|u| u.username.as_str()),
            "session changed"
        );
        self.session = session;
        self.favorites.reset();
        self.wallet.reset();
        self.portfolio.reset();
        self.history.reset();
        self.refresh_selection();
    }

    pub fn list_option(&self) -> ListOption {
        self.list_option
    }

    pub fn set_list_option(&mut self, option: ListOption) {
        if option != self.list_option {
            self.list_option = option;
            self.hot.invalidate();
        }
    }

    pub fn hot_state(&self) -> &Loadable<Vec<Quote>> {
        self.hot.state()
    }

    pub fn hot_records(&self) -> &[Quote] {
        self.hot_records.get()
    }

    pub fn begin_hot_fetch(&mut self) -> Option<(u64, ListOption)> {
        if !self.hot.needs_fetch() {
            return None;
        }
        Some((self.hot.begin(), self.list_option))
    }

    pub fn apply_hot(&mut self, seq: u64, result: Result<Vec<Quote>, FetchError>) {
        if !self.hot.is_current(seq) {
            tracing::debug!(seq, "drop superseded hot list");
            return;
        }
        if let Ok(quotes) = &result {
            self.hot_records.set(quotes.clone());
        }
        self.hot.settle(seq, Loadable::from_list(result));
        self.refresh_selection();
    }

    pub fn favorites(&self) -> &FavoritesManager {
        &self.favorites
    }

    pub fn begin_favorites_fetch(&mut self) -> Option<u64> {
        self.favorites
            .needs_fetch(&self.session)
            .then(|| self.favorites.begin_fetch())
    }

    pub fn apply_favorites(&mut self, seq: u64, result: Result<Vec<Quote>, FetchError>) {
        self.favorites.apply_fetch(seq, result);
        self.refresh_selection();
    }

    /// Tentatively toggle the selected instrument. `Ok(None)` means nothing to persist.
    pub fn toggle_favorite(&mut self) -> Result<Option<FavoriteWrite>, AppError> {
        let Some(symbol) = self.symbol.clone() else {
            return Ok(None);
        };
        let quote = match self.instrument() {
            Some(instrument) => Quote {
                symbol: instrument.symbol,
                name: instrument.name,
                price: instrument.price,
                change_percent: instrument.change_percent,
            },
            None => Quote {
                symbol,
                ..Quote::default()
            },
        };
        let result = self.favorites.begin_toggle(&self.session, &quote);
        if let Err(err) = &result {
            self.notice = Some(err.clone().into());
        }
        self.refresh_selection();
        result
    }

    pub fn settle_favorite(&mut self, write: &FavoriteWrite, result: Result<(), FetchError>) {
        if let Err(err) = self.favorites.settle(write, result) {
            self.notice = Some(err.into());
        }
        self.refresh_selection();
    }

    pub fn search(&self) -> &SearchResults {
        &self.search
    }

    pub fn search_mut(&mut self) -> &mut SearchResults {
        &mut self.search
    }

    /// Search results the user opened, most recent first
    pub fn picks(&self) -> &[Quote] {
        self.picks.get()
    }

    /// Open a search result: it becomes the highest-priority source for its symbol
    pub fn pick_search_result(&mut self, quote: Quote) {
        let symbol = quote.symbol.clone();
        self.picks.update(|picks| {
            picks.retain(|q| q.symbol != quote.symbol);
            picks.insert(0, quote);
            picks.truncate(MAX_PICKS);
        });
        self.select(symbol);
    }

    pub fn symbol(&self) -> Option<&Symbol> {
        self.symbol.as_ref()
    }

    pub fn select(&mut self, symbol: Symbol) {
        if self.symbol.as_ref() != Some(&symbol) {
            self.details = Loadable::Idle;
            self.details_for = None;
            self.chart = Loadable::Idle;
            self.chart_for = None;
        }
        self.symbol = Some(symbol);
        self.refresh_selection();
    }

    pub fn selected(&self) -> Option<&SelectedInstrument> {
        self.resolver.current()
    }

    /// The instrument for the current symbol: the resolved record if it is for that symbol,
    /// otherwise the quote of loaded details. Never a record of another symbol.
    pub fn instrument(&self) -> Option<SelectedInstrument> {
        let symbol = self.symbol.as_ref()?;
        if let Some(selected) = self.selected().filter(|s| &s.symbol == symbol) {
            return Some(selected.clone());
        }
        self.details
            .ready()
            .map(|details| &details.quote)
            .filter(|quote| &quote.symbol == symbol && !quote.is_symbol_only())
            .map(SelectedInstrument::from)
    }

    pub fn resolver(&self) -> &SelectionResolver {
        &self.resolver
    }

    /// Re-run the resolver if the symbol or a source changed
    pub fn refresh_selection(&mut self) -> bool {
        let Some(symbol) = self.symbol.as_ref() else {
            return false;
        };
        let revisions = Revisions {
            search: self.picks.revision(),
            favorites: self.favorites.revision(),
            hot_list: self.hot_records.revision(),
        };
        let sources = Sources {
            search: self.picks.get(),
            favorites: self.favorites.set().items(),
            hot_list: self.hot_records.get(),
            fallback: sample_quotes(),
        };
        self.resolver.update(symbol, revisions, &sources)
    }

    pub fn details(&self) -> &Loadable<StockDetails> {
        &self.details
    }

    pub fn begin_details(&mut self) -> Option<Symbol> {
        let symbol = self.symbol.clone()?;
        if self.details_for.as_ref() == Some(&symbol) {
            return None;
        }
        self.details_for = Some(symbol.clone());
        self.details = Loadable::Loading;
        Some(symbol)
    }

    pub fn apply_details(&mut self, symbol: &Symbol, result: Result<StockDetails, FetchError>) {
        if self.details_for.as_ref() == Some(symbol) {
            self.details = Loadable::from_result(result);
        }
    }

    pub fn interval(&self) -> ChartInterval {
        self.interval
    }

    pub fn set_interval(&mut self, interval: ChartInterval) {
        self.interval = interval;
    }

    pub fn chart(&self) -> &Loadable<Vec<Candle>> {
        &self.chart
    }

    pub fn begin_chart(&mut self) -> Option<(Symbol, ChartInterval)> {
        let key = (self.symbol.clone()?, self.interval);
        if self.chart_for.as_ref() == Some(&key) {
            return None;
        }
        self.chart_for = Some(key.clone());
        self.chart = Loadable::Loading;
        Some(key)
    }

    pub fn apply_chart(
        &mut self,
        key: &(Symbol, ChartInterval),
        result: Result<Vec<Candle>, FetchError>,
    ) {
        if self.chart_for.as_ref() == Some(key) {
            self.chart = Loadable::from_list(result);
        }
    }

    pub fn wallet(&self) -> &Loadable<Wallet> {
        self.wallet.state()
    }

    pub fn portfolio(&self) -> &Loadable<Portfolio> {
        self.portfolio.state()
    }

    pub fn history(&self) -> &Loadable<Vec<TradeRecord>> {
        self.history.state()
    }

    /// Sequence of the wallet fetch to start, if one is due
    pub fn begin_wallet(&mut self) -> Option<u64> {
        (self.session.is_authenticated() && self.wallet.needs_fetch())
            .then(|| self.wallet.begin())
    }

    pub fn apply_wallet(&mut self, seq: u64, result: Result<Wallet, FetchError>) {
        self.wallet.settle(seq, Loadable::from_result(result));
    }

    pub fn begin_portfolio(&mut self) -> Option<u64> {
        (self.session.is_authenticated() && self.portfolio.needs_fetch())
            .then(|| self.portfolio.begin())
    }

    pub fn apply_portfolio(&mut self, seq: u64, result: Result<Portfolio, FetchError>) {
        self.portfolio.settle(seq, Loadable::from_result(result));
    }

    pub fn begin_history(&mut self) -> Option<u64> {
        (self.session.is_authenticated() && self.history.needs_fetch())
            .then(|| self.history.begin())
    }

    pub fn apply_history(&mut self, seq: u64, result: Result<Vec<TradeRecord>, FetchError>) {
        self.history.settle(seq, Loadable::from_list(result));
    }

    /// Manual refresh: everything backend-owned is refetched on the next pass
    pub fn invalidate_all(&mut self) {
        self.hot.invalidate();
        self.favorites.invalidate();
        self.wallet.invalidate();
        self.portfolio.invalidate();
        self.history.invalidate();
        self.details_for = None;
        self.chart_for = None;
    }

    pub fn trade(&self) -> &TradeFlow {
        &self.trade
    }

    pub fn trade_mut(&mut self) -> &mut TradeFlow {
        &mut self.trade
    }

    /// Open the buy or sell panel for the selected instrument
    pub fn open_trade(&mut self, side: TradeSide) -> Result<(), AppError> {
        let result = if self.session.is_authenticated() {
            match self.instrument() {
                Some(instrument) => self.trade.open(&instrument, side).map_err(AppError::from),
                None => Err(ValidationError::NoSelection.into()),
            }
        } else {
            Err(AppError::AuthRequired)
        };
        if let Err(err) = &result {
            self.notice = Some(err.clone().into());
        }
        result
    }

    pub fn confirm_trade(&mut self) -> Option<Submission> {
        self.trade.confirm()
    }

    pub fn finish_trade(
        &mut self,
        ticket: u64,
        result: Result<crate::data::TradeReceipt, FetchError>,
    ) -> Settlement {
        let settlement = self.trade.finish(ticket, result);
        self.apply_settlement(&settlement);
        settlement
    }

    fn apply_settlement(&mut self, settlement: &Settlement) {
        if settlement.invalidates_caches() {
            self.wallet.invalidate();
            self.portfolio.invalidate();
            self.history.invalidate();
        }
        match settlement {
            Settlement::Completed(receipt) => {
                self.notice = Some(Notice::Info(format!(
                    "{} {} {} @ {}",
                    receipt.side.path(),
                    receipt.quantity,
                    receipt.symbol,
                    receipt.price
                )));
            }
            Settlement::Failed(AppError::AuthRequired) => {
                self.notice = Some(Notice::LoginRequired);
            }
            Settlement::Failed(_) | Settlement::Discarded { .. } => {}
        }
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }
}
