use std::future::Future;

use bevy_ecs::{prelude::*, system::CommandQueue};
use ratatui::{layout::Rect, Frame};
use tokio::{runtime::Handle, sync::mpsc};

use crate::api::Api;
use crate::app::{AppState, Popup};
use crate::data::{Quote, Session, TradeSide};
use crate::search::SearchEvent;
use crate::state::{Dashboard, Notice};
use crate::ui::content::Content;
use crate::views::{market::MarketView, portfolio::PortfolioView};
use crate::widgets::{Loading, LoadingWidget, QuantityInput, SearchBox, Terminal};

/// Bars requested for the price chart
pub const CHART_LIMIT: usize = 120;
/// Rows requested for the trade history
pub const HISTORY_LIMIT: usize = 50;

type Chrome<'w> = (Res<'w, State<AppState>>, Res<'w, Endpoint>, Res<'w, Popup>);
type PopUp<'w> = (ResMut<'w, SearchBox>, Res<'w, QuantityInput>);

#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Tab,
    Enter,
}

/// Runs background work and hands its result back to the main loop
#[derive(Clone, Resource)]
pub struct Command {
    tx: mpsc::UnboundedSender<CommandQueue>,
    rt: Handle,
}

impl Command {
    pub fn new(tx: mpsc::UnboundedSender<CommandQueue>, rt: Handle) -> Self {
        Self { tx, rt }
    }

    pub fn send(&self, queue: CommandQueue) {
        if self.tx.send(queue).is_err() {
            tracing::debug!("main loop gone, dropping update");
        }
    }

    /// Spawn `task`; `apply` runs on the main loop with its output
    pub fn spawn<T, F>(&self, task: F, apply: impl FnOnce(&mut World, T) + Send + 'static)
    where
        T: Send + 'static,
        F: Future<Output = T> + Send + 'static,
    {
        let this = self.clone();
        self.rt.spawn(async move {
            let output = task.await;
            let mut queue = CommandQueue::default();
            queue.push(move |world: &mut World| apply(world, output));
            this.send(queue);
        });
    }

    /// Forward debouncer events into the dashboard's search results
    pub fn search_sink(&self) -> impl Fn(SearchEvent) + Send + Sync + 'static {
        let this = self.clone();
        move |event| {
            let mut queue = CommandQueue::default();
            queue.push(move |world: &mut World| {
                world.resource_mut::<Dashboard>().search_mut().apply(event);
            });
            this.send(queue);
        }
    }
}

#[derive(Clone, Copy, Debug, Resource)]
pub struct HotLimit(pub usize);

/// Backend host shown in the footer
#[derive(Clone, Debug, Default, Resource)]
pub struct Endpoint(pub String);

/// View the stock view returns to
#[derive(Clone, Copy, Debug, Resource)]
pub struct LastView(pub AppState);

impl Default for LastView {
    fn default() -> Self {
        Self(AppState::Market)
    }
}

pub fn error(mut terminal: ResMut<Terminal>, err: Res<Content<'static>>) {
    _ = terminal.draw(|frame| {
        frame.render_widget(err.clone(), frame.size());
    });
}

pub fn loading(mut terminal: ResMut<Terminal>, loading: Res<Loading>) {
    _ = terminal.draw(|frame| {
        frame.render_widget(LoadingWidget::from(&*loading), frame.size());
    });
}

/// Ask the backend who we are, then leave the loading screen
pub fn detect_session(api: &Api, command: &Command) {
    let api = api.clone();
    command.spawn(async move { api.whoami().await }, |world, result| {
        let mut dashboard = world.resource_mut::<Dashboard>();
        match result {
            Ok(Some(user)) => {
                tracing::info!(user = %user.username, "signed in");
                dashboard.set_session(Session::Authenticated(user));
            }
            Ok(None) => {
                tracing::info!("no session, continuing as guest");
                dashboard.set_session(Session::Anonymous);
            }
            Err(err) => {
                tracing::error!(error = %err, "whoami failed");
                dashboard.set_session(Session::Anonymous);
                dashboard.set_notice(Notice::Error(err.to_string()));
            }
        }
        world.insert_resource(NextState(Some(AppState::Market)));
    });
}

fn request_hot(dashboard: &mut Dashboard, api: &Api, command: &Command, limit: usize) {
    let Some((seq, option)) = dashboard.begin_hot_fetch() else {
        return;
    };
    tracing::debug!(seq, option = option.as_param(), "fetch stock list");
    let api = api.clone();
    command.spawn(
        async move { api.stock_list(option, limit).await },
        move |world, result| world.resource_mut::<Dashboard>().apply_hot(seq, result),
    );
}

fn request_favorites(dashboard: &mut Dashboard, api: &Api, command: &Command) {
    let Some(seq) = dashboard.begin_favorites_fetch() else {
        return;
    };
    let api = api.clone();
    command.spawn(
        async move { api.favorites().await },
        move |world, result| {
            world
                .resource_mut::<Dashboard>()
                .apply_favorites(seq, result);
        },
    );
}

fn request_wallet(dashboard: &mut Dashboard, api: &Api, command: &Command) {
    let Some(seq) = dashboard.begin_wallet() else {
        return;
    };
    let api = api.clone();
    command.spawn(async move { api.wallet().await }, move |world, result| {
        world.resource_mut::<Dashboard>().apply_wallet(seq, result);
    });
}

pub fn fetch_market(
    mut dashboard: ResMut<Dashboard>,
    api: Res<Api>,
    command: Res<Command>,
    limit: Res<HotLimit>,
) {
    request_hot(&mut dashboard, &api, &command, limit.0);
    request_favorites(&mut dashboard, &api, &command);
}

pub fn fetch_stock(
    mut dashboard: ResMut<Dashboard>,
    api: Res<Api>,
    command: Res<Command>,
    limit: Res<HotLimit>,
) {
    if let Some(symbol) = dashboard.begin_details() {
        let api = api.clone();
        let key = symbol.clone();
        command.spawn(
            async move { api.details(&symbol).await },
            move |world, result| {
                world
                    .resource_mut::<Dashboard>()
                    .apply_details(&key, result);
            },
        );
    }
    if let Some(key) = dashboard.begin_chart() {
        let api = api.clone();
        let (symbol, interval) = key.clone();
        command.spawn(
            async move { api.chart(&symbol, interval, CHART_LIMIT).await },
            move |world, result| world.resource_mut::<Dashboard>().apply_chart(&key, result),
        );
    }
    // hot list records and favorites are resolver sources for the selection
    request_hot(&mut dashboard, &api, &command, limit.0);
    request_favorites(&mut dashboard, &api, &command);
    request_wallet(&mut dashboard, &api, &command);
}

pub fn fetch_portfolio(mut dashboard: ResMut<Dashboard>, api: Res<Api>, command: Res<Command>) {
    request_wallet(&mut dashboard, &api, &command);
    if let Some(seq) = dashboard.begin_portfolio() {
        let api = api.clone();
        command.spawn(async move { api.portfolio().await }, move |world, result| {
            world.resource_mut::<Dashboard>().apply_portfolio(seq, result);
        });
    }
    if let Some(seq) = dashboard.begin_history() {
        let api = api.clone();
        command.spawn(
            async move { api.trade_history(HISTORY_LIMIT).await },
            move |world, result| world.resource_mut::<Dashboard>().apply_history(seq, result),
        );
    }
}

fn draw(
    terminal: &mut Terminal,
    (state, endpoint, popup): &Chrome,
    dashboard: &Dashboard,
    (search, quantity): &mut PopUp,
    body: impl FnOnce(&mut Frame, Rect),
) {
    _ = terminal.draw(|frame| {
        let (top, rect, bottom) = crate::ui::rect::frame_rows(frame.size());
        crate::views::navbar::render(frame, top, *state.get(), dashboard.session());
        crate::views::footer::render(frame, bottom, &endpoint.0, dashboard);
        body(frame, rect);
        crate::views::popup::render(frame, rect, **popup, dashboard, search, quantity);
    });
}

pub fn render_market(
    mut terminal: ResMut<Terminal>,
    mut events: EventReader<Key>,
    mut dashboard: ResMut<Dashboard>,
    mut view: ResMut<MarketView>,
    mut next: ResMut<NextState<AppState>>,
    mut last: ResMut<LastView>,
    chrome: Chrome,
    mut popup: PopUp,
) {
    for event in &mut events {
        if let Some(symbol) = view.handle(event, &dashboard) {
            dashboard.select(symbol);
            last.0 = AppState::Market;
            next.set(AppState::Stock);
        }
    }

    draw(&mut terminal, &chrome, &dashboard, &mut popup, |frame, rect| {
        crate::views::market::render(frame, rect, &dashboard, &mut view);
    });
}

pub fn render_stock(
    mut terminal: ResMut<Terminal>,
    mut events: EventReader<Key>,
    dashboard: Res<Dashboard>,
    chrome: Chrome,
    mut popup: PopUp,
) {
    // the stock view has no cursor
    events.clear();

    draw(&mut terminal, &chrome, &dashboard, &mut popup, |frame, rect| {
        crate::views::stock::render(frame, rect, &dashboard);
    });
}

pub fn render_portfolio(
    mut terminal: ResMut<Terminal>,
    mut events: EventReader<Key>,
    mut dashboard: ResMut<Dashboard>,
    mut view: ResMut<PortfolioView>,
    mut next: ResMut<NextState<AppState>>,
    mut last: ResMut<LastView>,
    chrome: Chrome,
    mut popup: PopUp,
) {
    for event in &mut events {
        if let Some(symbol) = view.handle(event, &dashboard) {
            dashboard.select(symbol);
            last.0 = AppState::Portfolio;
            next.set(AppState::Stock);
        }
    }

    draw(&mut terminal, &chrome, &dashboard, &mut popup, |frame, rect| {
        crate::views::portfolio::render(frame, rect, &dashboard, &mut view);
    });
}

/// Open a search result in the stock view
pub fn open_quote(world: &mut World, quote: Quote) {
    let state = *world.resource::<State<AppState>>().get();
    if state != AppState::Stock {
        world.insert_resource(LastView(state));
    }
    world.resource_mut::<Dashboard>().pick_search_result(quote);
    world.insert_resource(NextState(Some(AppState::Stock)));
}

/// Optimistically toggle the selected instrument and persist the change
pub fn toggle_favorite(world: &mut World) {
    let write = match world.resource_mut::<Dashboard>().toggle_favorite() {
        Ok(Some(write)) => write,
        Ok(None) => return,
        Err(err) => {
            tracing::info!(error = %err, "favorite toggle refused");
            return;
        }
    };
    let api = world.resource::<Api>().clone();
    let command = world.resource::<Command>().clone();
    let pending = write.clone();
    command.spawn(
        async move { crate::favorites::persist(&*api, &pending).await },
        move |world, result| {
            world
                .resource_mut::<Dashboard>()
                .settle_favorite(&write, result);
        },
    );
}

pub fn open_trade(world: &mut World, side: TradeSide) {
    let quantity = {
        let mut dashboard = world.resource_mut::<Dashboard>();
        if dashboard.open_trade(side).is_err() {
            return;
        }
        dashboard.trade().panel().map(|panel| panel.quantity)
    };
    if let Some(quantity) = quantity {
        world.resource_mut::<QuantityInput>().set(quantity);
    }
}

/// Submit the open panel. A second confirm while one is in flight does nothing.
pub fn confirm_trade(world: &mut World) {
    let Some(submission) = world.resource_mut::<Dashboard>().confirm_trade() else {
        return;
    };
    let api = world.resource::<Api>().clone();
    let command = world.resource::<Command>().clone();
    let ticket = submission.ticket;
    command.spawn(
        async move { crate::trade::submit(&*api, &submission).await },
        move |world, result| {
            let settlement = world
                .resource_mut::<Dashboard>()
                .finish_trade(ticket, result);
            tracing::info!(ticket, ?settlement, "trade settled");
        },
    );
}
