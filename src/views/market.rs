use bevy_ecs::prelude::Resource;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use crate::data::{Loadable, Quote, Symbol};
use crate::helper::{cycle, DecimalExt, Sign};
use crate::state::Dashboard;
use crate::system::Key;
use crate::ui::{styles, text::align_right};

const WIDTHS: [Constraint; 4] = [
    Constraint::Length(8),
    Constraint::Min(12),
    Constraint::Length(10),
    Constraint::Length(9),
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Pane {
    #[default]
    Hot,
    Favorites,
}

/// Cursor state of the market view
#[derive(Debug, Default, Resource)]
pub struct MarketView {
    pub focus: Pane,
    hot: TableState,
    favorites: TableState,
}

impl MarketView {
    fn rows(pane: Pane, dashboard: &Dashboard) -> &[Quote] {
        match pane {
            Pane::Hot => dashboard.hot_records(),
            Pane::Favorites => dashboard.favorites().set().items(),
        }
    }

    fn table_mut(&mut self, pane: Pane) -> &mut TableState {
        match pane {
            Pane::Hot => &mut self.hot,
            Pane::Favorites => &mut self.favorites,
        }
    }

    /// Move the cursor; `Enter` yields the symbol to open
    pub fn handle(&mut self, key: &Key, dashboard: &Dashboard) -> Option<Symbol> {
        let focus = self.focus;
        let rows = Self::rows(focus, dashboard);
        let table = self.table_mut(focus);
        match key {
            Key::Up => table.select(cycle::prev(table.selected(), rows.len())),
            Key::Down => table.select(cycle::next(table.selected(), rows.len())),
            Key::Tab => {
                self.focus = match focus {
                    Pane::Hot => Pane::Favorites,
                    Pane::Favorites => Pane::Hot,
                };
            }
            Key::Enter => {
                return table
                    .selected()
                    .and_then(|idx| rows.get(idx))
                    .map(|quote| quote.symbol.clone());
            }
        }
        None
    }
}

pub fn render(frame: &mut Frame, rect: Rect, dashboard: &Dashboard, view: &mut MarketView) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(rect);

    // rows can shrink after a refetch
    for pane in [Pane::Hot, Pane::Favorites] {
        let len = MarketView::rows(pane, dashboard).len();
        let table = view.table_mut(pane);
        table.select(cycle::clamp(table.selected(), len));
    }

    let option = dashboard.list_option().as_param();
    let hot_title = format!(
        " {} [o] {} ",
        t!(format!("list.{option}")).to_string(),
        if dashboard.hot_state().is_loading() {
            t!("Refreshing").to_string()
        } else {
            String::new()
        }
    );
    quote_table(
        frame,
        chunks[0],
        hot_title,
        dashboard.hot_records(),
        dashboard.hot_state(),
        view.focus == Pane::Hot,
        &mut view.hot,
        dashboard,
    );

    let favorites = dashboard.favorites();
    let title = format!(" {} ({}) ", t!("Favorites").to_string(), favorites.set().len());
    if dashboard.session().is_authenticated() {
        quote_table(
            frame,
            chunks[1],
            title,
            favorites.set().items(),
            favorites.status(),
            view.focus == Pane::Favorites,
            &mut view.favorites,
            dashboard,
        );
    } else {
        let hint = ratatui::widgets::Paragraph::new(t!("LoginHint").to_string())
            .style(styles::dark_gray())
            .wrap(ratatui::widgets::Wrap { trim: true })
            .block(block(title, view.focus == Pane::Favorites));
        frame.render_widget(hint, chunks[1]);
    }
}

fn block(title: String, focused: bool) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(if focused {
            styles::border_focused()
        } else {
            styles::border()
        })
        .title(Span::styled(title, styles::title()))
}

fn quote_table<T>(
    frame: &mut Frame,
    rect: Rect,
    title: String,
    quotes: &[Quote],
    state: &Loadable<T>,
    focused: bool,
    table: &mut TableState,
    dashboard: &Dashboard,
) {
    let block = block(title, focused);
    if quotes.is_empty() {
        if let Some(placeholder) = super::placeholder(state) {
            frame.render_widget(placeholder.block(block), rect);
            return;
        }
    }

    let header = Row::new(vec![
        Cell::from(t!("market.CODE").to_string()),
        Cell::from(t!("market.NAME").to_string()),
        Cell::from(align_right(&t!("market.PRICE").to_string(), 10)),
        Cell::from(align_right(&t!("market.CHG").to_string(), 9)),
    ])
    .style(styles::header());

    let favorites = dashboard.favorites();
    let rows = quotes
        .iter()
        .map(|quote| {
            let style = styles::up(quote.change_percent.sign());
            let marker = if favorites.is_pending(&quote.symbol) {
                Span::styled("…", styles::dark_gray())
            } else if favorites.set().contains(&quote.symbol) {
                Span::styled("★", styles::favorite())
            } else {
                Span::raw(" ")
            };
            Row::new(vec![
                Cell::from(Line::from(vec![
                    marker,
                    Span::raw(quote.symbol.to_string()),
                ])),
                Cell::from(quote.display_name().to_string()),
                Cell::from(align_right(&quote.price.format_price(), 10)).style(style),
                Cell::from(align_right(&quote.change_percent.format_percent(), 9)).style(style),
            ])
        })
        .collect::<Vec<_>>();

    let highlight = table
        .selected()
        .and_then(|idx| quotes.get(idx))
        .map(|quote| styles::up(quote.change_percent.sign()))
        .unwrap_or_default()
        .add_modifier(Modifier::REVERSED);

    let widget = Table::new(rows)
        .header(header)
        .block(block)
        .highlight_style(if focused { highlight } else { styles::text() })
        .widths(&WIDTHS)
        .column_spacing(1);
    frame.render_stateful_widget(widget, rect, table);
}

#[cfg(test)]
mod tests {
    use super::{MarketView, Pane};
    use crate::data::{Quote, Symbol};
    use crate::state::Dashboard;
    use crate::system::Key;
    use rust_decimal_macros::dec;

    fn dashboard() -> Dashboard {
        let mut dashboard = Dashboard::default();
        let (seq, _) = dashboard.begin_hot_fetch().expect("fetch");
        dashboard.apply_hot(
            seq,
            Ok(vec![
                Quote::new("AAPL", "Apple", dec!(190), dec!(1.2)),
                Quote::new("TSLA", "Tesla", dec!(240), dec!(-2.1)),
            ]),
        );
        dashboard
    }

    #[test]
    fn enter_opens_highlighted_hot_row() {
        let dashboard = dashboard();
        let mut view = MarketView::default();
        assert_eq!(view.handle(&Key::Enter, &dashboard), None);

        view.handle(&Key::Down, &dashboard);
        view.handle(&Key::Down, &dashboard);
        assert_eq!(view.handle(&Key::Enter, &dashboard), Some(Symbol::new("TSLA")));
    }

    #[test]
    fn tab_moves_focus_to_favorites() {
        let dashboard = dashboard();
        let mut view = MarketView::default();
        view.handle(&Key::Tab, &dashboard);
        assert_eq!(view.focus, Pane::Favorites);

        view.handle(&Key::Down, &dashboard);
        assert_eq!(view.handle(&Key::Enter, &dashboard), None, "no favorites loaded");
    }
}
