use std::time::Duration;

use bevy_app::prelude::*;
use bevy_ecs::prelude::*;
use bevy_ecs::system::SystemState;
use crossterm::event::{Event as TermEvent, KeyEvent, KeyEventKind};
use tokio::sync::mpsc;

use crate::api::Api;
use crate::config::Config;
use crate::data::TradeSide;
use crate::render::{DirtyFlags, RenderState};
use crate::search::SearchDebouncer;
use crate::state::Dashboard;
use crate::system::{self, Command, Endpoint, HotLimit, LastView};
use crate::ui::content::Content;
use crate::views::{market::MarketView, portfolio::PortfolioView};
use crate::widgets::{Loading, QuantityInput, SearchAction, SearchBox, Terminal};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, States)]
pub enum AppState {
    Error,
    #[default]
    Loading,
    Market,
    Stock,
    Portfolio,
}

/// Overlay drawn on top of the current view
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Resource)]
pub enum Popup {
    #[default]
    None,
    Help,
    Search,
}

/// Outcome of one key press
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Quit,
    Redraw(DirtyFlags),
}

pub async fn run(config: &Config, api: Api) -> anyhow::Result<()> {
    let (update_tx, mut update_rx) = mpsc::unbounded_channel();
    let command = Command::new(update_tx, tokio::runtime::Handle::current());
    let debouncer = SearchDebouncer::spawn(api.clone(), command.search_sink());

    let mut app = bevy_app::App::new();
    app.add_state::<AppState>()
        .add_event::<system::Key>()
        .insert_resource(Terminal::new()?)
        .init_resource::<Loading>()
        .init_resource::<Dashboard>()
        .init_resource::<Popup>()
        .init_resource::<LastView>()
        .init_resource::<MarketView>()
        .init_resource::<PortfolioView>()
        .init_resource::<QuantityInput>()
        .insert_resource(SearchBox::new(debouncer))
        .insert_resource(api.clone())
        .insert_resource(command.clone())
        .insert_resource(HotLimit(config.hot_limit))
        .insert_resource(Endpoint(
            config.api_url.host_str().unwrap_or_default().to_string(),
        ))
        .add_systems(Update, system::loading.run_if(in_state(AppState::Loading)))
        .add_systems(Update, system::error.run_if(in_state(AppState::Error)))
        .add_systems(
            Update,
            (system::fetch_market, system::render_market)
                .chain()
                .run_if(in_state(AppState::Market)),
        )
        .add_systems(
            Update,
            (system::fetch_stock, system::render_stock)
                .chain()
                .run_if(in_state(AppState::Stock)),
        )
        .add_systems(
            Update,
            (system::fetch_portfolio, system::render_portfolio)
                .chain()
                .run_if(in_state(AppState::Portfolio)),
        );

    system::detect_session(&api, &command);

    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut events = crossterm::event::EventStream::new();
    let mut render_state = RenderState::new();
    render_state.mark_all_dirty();

    loop {
        tokio::select! {
            _ = render_tick.tick() => {
                if *app.world.resource::<State<AppState>>().get() == AppState::Loading {
                    render_state.mark_dirty(DirtyFlags::LOADING);
                }
                if render_state.needs_render() {
                    app.update();
                    // a transition requested this frame is applied by the next update
                    if app.world.resource::<NextState<AppState>>().0.is_some() {
                        render_state.mark_all_dirty();
                    } else {
                        render_state.clear();
                    }
                } else {
                    render_state.skip();
                }
            }
            Some(mut queue) = update_rx.recv() => {
                queue.apply(&mut app.world);
                render_state.mark_dirty(DirtyFlags::ALL);
            }
            Some(event) = tokio_stream::StreamExt::next(&mut events) => {
                match event {
                    Ok(TermEvent::Key(event)) if event.kind == KeyEventKind::Press => {
                        match handle_key(&mut app.world, event) {
                            Flow::Quit => break,
                            Flow::Redraw(flags) => render_state.mark_dirty(flags),
                        }
                    }
                    Ok(TermEvent::Resize(..)) => render_state.mark_all_dirty(),
                    Ok(_) => {}
                    Err(err) => {
                        tracing::error!(error = %err, "terminal event stream failed");
                        app.world.insert_resource(Content::new(
                            t!("error.terminal.heading").to_string(),
                            err.to_string(),
                        ));
                        app.world.insert_resource(NextState(Some(AppState::Error)));
                        render_state.mark_dirty(DirtyFlags::ERROR);
                    }
                }
            }
        }
    }

    tracing::info!(stats = %render_state.stats(), "main loop exited");
    Ok(())
}

fn handle_key(world: &mut World, event: KeyEvent) -> Flow {
    if matches!(event, ctrl!('c')) {
        return Flow::Quit;
    }

    if world.resource::<Dashboard>().notice().is_some() {
        if matches!(event, key!(Esc) | key!(Enter) | key!('q')) {
            world.resource_mut::<Dashboard>().dismiss_notice();
            return Flow::Redraw(DirtyFlags::NONE.mark_popup_change(Popup::None));
        }
        return Flow::Redraw(DirtyFlags::NONE);
    }

    let state = *world.resource::<State<AppState>>().get();
    match state {
        AppState::Error => return Flow::Quit,
        AppState::Loading if matches!(event, key!('q')) => return Flow::Quit,
        AppState::Loading => return Flow::Redraw(DirtyFlags::NONE),
        AppState::Market | AppState::Stock | AppState::Portfolio => (),
    }

    if world.resource::<Dashboard>().trade().panel().is_some() {
        return handle_trade_key(world, event);
    }

    match *world.resource::<Popup>() {
        Popup::Help => {
            world.insert_resource(Popup::None);
            Flow::Redraw(DirtyFlags::NONE.mark_popup_change(Popup::None))
        }
        Popup::Search => handle_search_key(world, event),
        Popup::None => handle_view_key(world, state, event),
    }
}

fn sync_quantity(world: &mut World) {
    let quantity = world
        .resource::<Dashboard>()
        .trade()
        .panel()
        .map(|panel| panel.quantity);
    if let Some(quantity) = quantity {
        world.resource_mut::<QuantityInput>().set(quantity);
    }
}

fn handle_trade_key(world: &mut World, event: KeyEvent) -> Flow {
    if matches!(event, key!(Esc)) {
        world.resource_mut::<Dashboard>().trade_mut().close();
        return Flow::Redraw(DirtyFlags::NONE.mark_popup_change(Popup::None));
    }
    if world.resource::<Dashboard>().trade().is_submitting() {
        return Flow::Redraw(DirtyFlags::NONE);
    }

    match event {
        key!(Enter) => {
            let value = world.resource::<QuantityInput>().value().to_string();
            let valid = world
                .resource_mut::<Dashboard>()
                .trade_mut()
                .set_quantity(&value)
                .is_ok();
            if valid {
                system::confirm_trade(world);
            }
        }
        typed!('+') | key!(Up) => {
            world.resource_mut::<Dashboard>().trade_mut().increment();
            sync_quantity(world);
        }
        key!('-') | key!(Down) => {
            world.resource_mut::<Dashboard>().trade_mut().decrement();
            sync_quantity(world);
        }
        _ => {
            let value = world
                .resource_mut::<QuantityInput>()
                .handle_key(event)
                .map(str::to_string);
            if let Some(value) = value {
                // an invalid value is shown on the panel and the last valid one kept
                _ = world
                    .resource_mut::<Dashboard>()
                    .trade_mut()
                    .set_quantity(&value);
            }
        }
    }
    Flow::Redraw(DirtyFlags::POPUP)
}

fn handle_search_key(world: &mut World, event: KeyEvent) -> Flow {
    let (action, picked) = world.resource_scope(|world, mut search: Mut<SearchBox>| {
        let dashboard = world.resource::<Dashboard>();
        let options = search.options(dashboard).len();
        let action = search.handle_key(event, options);
        let picked = match action {
            SearchAction::Open(idx) => search.options(dashboard).get(idx).cloned(),
            SearchAction::Continue | SearchAction::Close => None,
        };
        if action != SearchAction::Continue {
            search.reset();
        }
        (action, picked)
    });

    if action == SearchAction::Continue {
        return Flow::Redraw(DirtyFlags::POPUP);
    }
    world.insert_resource(Popup::None);
    if let Some(quote) = picked {
        tracing::info!(symbol = %quote.symbol, "open search result");
        system::open_quote(world, quote);
        return Flow::Redraw(DirtyFlags::NONE.mark_state_change());
    }
    Flow::Redraw(DirtyFlags::NONE.mark_popup_change(Popup::None))
}

fn goto(world: &mut World, from: AppState, to: AppState) -> Flow {
    if from == to {
        return Flow::Redraw(DirtyFlags::NONE);
    }
    world.insert_resource(NextState(Some(to)));
    Flow::Redraw(DirtyFlags::NONE.mark_state_change())
}

fn handle_view_key(world: &mut World, state: AppState, event: KeyEvent) -> Flow {
    let view = DirtyFlags::for_state(state);
    match event {
        key!('1') => return goto(world, state, AppState::Market),
        key!('2') => return goto(world, state, AppState::Portfolio),
        key!('/') => {
            world.insert_resource(Popup::Search);
            return Flow::Redraw(DirtyFlags::NONE.mark_popup_change(Popup::Search));
        }
        typed!('?') => {
            world.insert_resource(Popup::Help);
            return Flow::Redraw(DirtyFlags::NONE.mark_popup_change(Popup::Help));
        }
        typed!('R') => {
            tracing::info!(?state, "manual refresh");
            world.resource_mut::<Dashboard>().invalidate_all();
        }
        key!('q') if state == AppState::Market => return Flow::Quit,
        key!(Esc) | key!('q') => match state {
            AppState::Stock => {
                let back = world.resource::<LastView>().0;
                return goto(world, state, back);
            }
            AppState::Portfolio => return goto(world, state, AppState::Market),
            _ => return Flow::Redraw(DirtyFlags::NONE),
        },
        key!('o') if state == AppState::Market => {
            let mut dashboard = world.resource_mut::<Dashboard>();
            let option = dashboard.list_option().next();
            dashboard.set_list_option(option);
        }
        key!('b') if state == AppState::Stock => {
            system::open_trade(world, TradeSide::Buy);
            return Flow::Redraw(DirtyFlags::POPUP);
        }
        key!('s') if state == AppState::Stock => {
            system::open_trade(world, TradeSide::Sell);
            return Flow::Redraw(DirtyFlags::POPUP);
        }
        key!('f') if state == AppState::Stock => system::toggle_favorite(world),
        key!('[') if state == AppState::Stock => {
            let mut dashboard = world.resource_mut::<Dashboard>();
            let interval = dashboard.interval().prev();
            dashboard.set_interval(interval);
        }
        key!(']') if state == AppState::Stock => {
            let mut dashboard = world.resource_mut::<Dashboard>();
            let interval = dashboard.interval().next();
            dashboard.set_interval(interval);
        }
        key!(Up) | key!('k') => send_evt(system::Key::Up, world),
        key!(Down) | key!('j') => send_evt(system::Key::Down, world),
        key!(Tab) => send_evt(system::Key::Tab, world),
        key!(Enter) => {
            send_evt(system::Key::Enter, world);
            return Flow::Redraw(DirtyFlags::ALL);
        }
        _ => return Flow::Redraw(DirtyFlags::NONE),
    }
    Flow::Redraw(view)
}

fn send_evt<T: Event>(evt: T, world: &mut World) {
    let mut state = SystemState::<EventWriter<T>>::new(world);
    state.get_mut(world).send(evt);
}

#[cfg(test)]
mod tests {
    use super::{handle_key, AppState, Flow, Popup};
    use crate::api::Api;
    use crate::data::{Session, Symbol, User};
    use crate::render::DirtyFlags;
    use crate::search::SearchDebouncer;
    use crate::state::{Dashboard, Notice};
    use crate::system::{self, Command, LastView};
    use crate::testkit::FakeBackend;
    use crate::trade::TradePhase;
    use crate::widgets::{QuantityInput, SearchBox};
    use bevy_ecs::prelude::*;
    use bevy_ecs::system::CommandQueue;
    use tokio::sync::mpsc;

    struct Harness {
        app: bevy_app::App,
        _rx: mpsc::UnboundedReceiver<CommandQueue>,
    }

    impl Harness {
        fn new(state: AppState) -> Self {
            let backend = FakeBackend::default();
            let api = Api::new(backend);
            let (tx, rx) = mpsc::unbounded_channel();
            let command = Command::new(tx, tokio::runtime::Handle::current());
            let debouncer = SearchDebouncer::spawn(api.clone(), |_| {});

            let mut app = bevy_app::App::new();
            app.add_state::<AppState>()
                .add_event::<system::Key>()
                .init_resource::<Dashboard>()
                .init_resource::<Popup>()
                .init_resource::<LastView>()
                .init_resource::<QuantityInput>()
                .insert_resource(SearchBox::new(debouncer))
                .insert_resource(api)
                .insert_resource(command);
            app.world.insert_resource(NextState(Some(state)));
            app.update();
            Self { app, _rx: rx }
        }

        fn press(&mut self, event: crossterm::event::KeyEvent) -> Flow {
            let flow = handle_key(&mut self.app.world, event);
            self.app.update();
            flow
        }

        fn state(&self) -> AppState {
            *self.app.world.resource::<State<AppState>>().get()
        }

        fn dashboard(&mut self) -> Mut<'_, Dashboard> {
            self.app.world.resource_mut::<Dashboard>()
        }
    }

    #[tokio::test]
    async fn tabs_switch_views_and_q_quits_market() {
        let mut h = Harness::new(AppState::Market);
        h.press(key!('2'));
        assert_eq!(h.state(), AppState::Portfolio);
        h.press(key!('q'));
        assert_eq!(h.state(), AppState::Market);
        assert_eq!(h.press(key!('q')), Flow::Quit);
    }

    #[tokio::test]
    async fn escape_from_stock_returns_to_origin() {
        let mut h = Harness::new(AppState::Stock);
        h.app.world.insert_resource(LastView(AppState::Portfolio));
        h.press(key!(Esc));
        assert_eq!(h.state(), AppState::Portfolio);
    }

    #[tokio::test]
    async fn notice_swallows_keys_until_dismissed() {
        let mut h = Harness::new(AppState::Market);
        h.dashboard().set_notice(Notice::LoginRequired);

        assert_eq!(h.press(key!('2')), Flow::Redraw(DirtyFlags::NONE));
        assert_eq!(h.state(), AppState::Market);
        h.press(key!(Enter));
        assert!(h.dashboard().notice().is_none());
    }

    #[tokio::test]
    async fn help_popup_closes_on_any_key() {
        let mut h = Harness::new(AppState::Market);
        h.press(shift!('?'));
        assert_eq!(*h.app.world.resource::<Popup>(), Popup::Help);
        h.press(key!('x'));
        assert_eq!(*h.app.world.resource::<Popup>(), Popup::None);
    }

    #[tokio::test]
    async fn anonymous_buy_shows_login_notice() {
        let mut h = Harness::new(AppState::Stock);
        h.dashboard().select(Symbol::new("AAPL"));
        h.press(key!('b'));
        assert_eq!(h.dashboard().notice(), Some(&Notice::LoginRequired));
        assert_eq!(h.dashboard().trade().phase(), TradePhase::Idle);
    }

    #[tokio::test]
    async fn trade_panel_takes_quantity_keys() {
        let mut h = Harness::new(AppState::Stock);
        h.dashboard()
            .set_session(Session::Authenticated(User::default()));
        h.dashboard().select(Symbol::new("AAPL"));

        h.press(key!('b'));
        assert_eq!(h.dashboard().trade().phase(), TradePhase::PanelOpen);
        h.press(key!(Up));
        h.press(key!(Up));
        assert_eq!(h.app.world.resource::<QuantityInput>().value(), "3");

        h.press(key!(Backspace));
        h.press(key!('1'));
        h.press(key!('2'));
        assert_eq!(h.dashboard().trade().panel().map(|p| p.quantity), Some(12));

        // view shortcuts are inert while the panel is open
        h.press(key!('/'));
        assert_eq!(*h.app.world.resource::<Popup>(), Popup::None);
        assert_eq!(h.dashboard().trade().panel().map(|p| p.quantity), Some(12));

        h.press(key!(Esc));
        assert_eq!(h.dashboard().trade().phase(), TradePhase::Idle);
    }

    #[tokio::test]
    async fn slash_opens_search_and_escape_closes_it() {
        let mut h = Harness::new(AppState::Market);
        h.press(key!('/'));
        assert_eq!(*h.app.world.resource::<Popup>(), Popup::Search);
        h.press(key!('q'));
        assert_eq!(h.app.world.resource::<SearchBox>().query(), "q");
        h.press(key!(Esc));
        assert_eq!(*h.app.world.resource::<Popup>(), Popup::None);
        assert_eq!(h.app.world.resource::<SearchBox>().query(), "");
    }
}
