use bevy_ecs::prelude::Resource;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use crate::data::{Holding, Loadable, Symbol};
use crate::helper::{cycle, DecimalExt, Sign};
use crate::state::Dashboard;
use crate::system::Key;
use crate::ui::{styles, text};

/// Cursor over the holdings table
#[derive(Debug, Default, Resource)]
pub struct PortfolioView {
    holdings: TableState,
}

impl PortfolioView {
    fn holdings(dashboard: &Dashboard) -> &[Holding] {
        dashboard
            .portfolio()
            .ready()
            .map(|p| p.holdings.as_slice())
            .unwrap_or_default()
    }

    /// Move the cursor; `Enter` yields the holding to open
    pub fn handle(&mut self, key: &Key, dashboard: &Dashboard) -> Option<Symbol> {
        let holdings = Self::holdings(dashboard);
        match key {
            Key::Up => self
                .holdings
                .select(cycle::prev(self.holdings.selected(), holdings.len())),
            Key::Down => self
                .holdings
                .select(cycle::next(self.holdings.selected(), holdings.len())),
            Key::Enter => {
                return self
                    .holdings
                    .selected()
                    .and_then(|idx| holdings.get(idx))
                    .map(|h| h.symbol.clone());
            }
            Key::Tab => {}
        }
        None
    }
}

pub fn render(frame: &mut Frame, rect: Rect, dashboard: &Dashboard, view: &mut PortfolioView) {
    if !dashboard.session().is_authenticated() {
        let hint = Paragraph::new(t!("LoginHint").to_string())
            .style(styles::dark_gray())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(styles::border()),
            );
        frame.render_widget(hint, crate::ui::rect::centered(60, 5, rect));
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Percentage(55),
            Constraint::Min(5),
        ])
        .split(rect);

    summary(frame, chunks[0], dashboard);
    holdings(frame, chunks[1], dashboard, view);
    history(frame, chunks[2], dashboard);
}

fn titled(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border())
        .title(Span::styled(format!(" {title} "), styles::title()))
}

fn summary(frame: &mut Frame, rect: Rect, dashboard: &Dashboard) {
    let block = titled(t!("portfolio.Summary").to_string());
    let mut lines = vec![];

    match dashboard.wallet() {
        Loadable::Ready(wallet) => lines.push(Line::from(vec![
            Span::styled(format!("{}: ", t!("portfolio.Cash").to_string()), styles::label()),
            Span::styled(wallet.balance.format_money(), styles::text()),
            Span::styled(format!(" {}", wallet.currency), styles::currency(&wallet.currency)),
        ])),
        state => {
            if let Some(err) = state.error() {
                lines.push(Line::styled(t!("LoadFailed", error = err).to_string(), styles::error()));
            }
        }
    }

    if let Some(p) = dashboard.portfolio().ready() {
        let style = styles::up(p.total_pnl.sign());
        lines.push(Line::from(vec![
            Span::styled(format!("{}: ", t!("portfolio.TotalValue").to_string()), styles::label()),
            Span::styled(format!("{}  ", p.total_value.format_money()), styles::text()),
            Span::styled(format!("{}: ", t!("portfolio.MarketValue").to_string()), styles::label()),
            Span::styled(format!("{}  ", p.market_value.format_money()), styles::text()),
            Span::styled(format!("{}: ", t!("portfolio.PnL").to_string()), styles::label()),
            Span::styled(
                format!(
                    "{} ({})",
                    p.total_pnl.format_money(),
                    p.total_pnl_percent.format_percent()
                ),
                style,
            ),
        ]));
    }

    frame.render_widget(Paragraph::new(lines).block(block), rect);
}

fn holdings(frame: &mut Frame, rect: Rect, dashboard: &Dashboard, view: &mut PortfolioView) {
    const WIDTHS: [Constraint; 6] = [
        Constraint::Length(8),
        Constraint::Min(12),
        Constraint::Length(8),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(20),
    ];

    let block = titled(t!("portfolio.Holdings").to_string());
    let rows = PortfolioView::holdings(dashboard);
    if rows.is_empty() {
        let paragraph = super::placeholder(dashboard.portfolio())
            .unwrap_or_else(|| Paragraph::new(t!("portfolio.NoHoldings").to_string()).style(styles::dark_gray()));
        frame.render_widget(paragraph.block(block), rect);
        return;
    }
    view.holdings
        .select(cycle::clamp(view.holdings.selected(), rows.len()));

    let header = Row::new(vec![
        Cell::from(t!("market.CODE").to_string()),
        Cell::from(t!("market.NAME").to_string()),
        Cell::from(text::align_right(&t!("portfolio.Qty").to_string(), 8)),
        Cell::from(text::align_right(&t!("portfolio.AvgCost").to_string(), 10)),
        Cell::from(text::align_right(&t!("market.PRICE").to_string(), 10)),
        Cell::from(text::align_right(&t!("portfolio.PnL").to_string(), 20)),
    ])
    .style(styles::header());

    let rows = rows
        .iter()
        .map(|h| {
            let style = styles::up(h.pnl.sign());
            Row::new(vec![
                Cell::from(h.symbol.to_string()),
                Cell::from(h.name.clone()),
                Cell::from(text::align_right(&h.quantity.normalize().to_string(), 8)),
                Cell::from(text::align_right(&h.avg_cost.format_price(), 10)),
                Cell::from(text::align_right(&h.current_price.format_price(), 10)),
                Cell::from(text::align_right(
                    &format!("{} {}", h.pnl.format_money(), h.pnl_percent.format_percent()),
                    20,
                ))
                .style(style),
            ])
        })
        .collect::<Vec<_>>();

    let table = Table::new(rows)
        .header(header)
        .block(block)
        .highlight_style(styles::text().add_modifier(Modifier::REVERSED))
        .widths(&WIDTHS)
        .column_spacing(1);
    frame.render_stateful_widget(table, rect, &mut view.holdings);
}

fn history(frame: &mut Frame, rect: Rect, dashboard: &Dashboard) {
    const WIDTHS: [Constraint; 6] = [
        Constraint::Length(16),
        Constraint::Length(8),
        Constraint::Length(5),
        Constraint::Length(8),
        Constraint::Length(10),
        Constraint::Length(14),
    ];

    let block = titled(t!("portfolio.History").to_string());
    let records = dashboard.history();
    let Some(records) = records.ready() else {
        if let Some(placeholder) = super::placeholder(records) {
            frame.render_widget(placeholder.block(block), rect);
        }
        return;
    };

    let header = Row::new(vec![
        Cell::from(t!("portfolio.Time").to_string()),
        Cell::from(t!("market.CODE").to_string()),
        Cell::from(t!("portfolio.Side").to_string()),
        Cell::from(text::align_right(&t!("portfolio.Qty").to_string(), 8)),
        Cell::from(text::align_right(&t!("market.PRICE").to_string(), 10)),
        Cell::from(text::align_right(&t!("portfolio.Total").to_string(), 14)),
    ])
    .style(styles::header());

    let rows = records
        .iter()
        .map(|r| {
            Row::new(vec![
                Cell::from(text::datetime(r.executed_at)),
                Cell::from(r.symbol.to_string()),
                Cell::from(t!(format!("side.{}", r.side.path())).to_string()).style(styles::side(r.side)),
                Cell::from(text::align_right(&r.quantity.to_string(), 8)),
                Cell::from(text::align_right(&r.price.format_price(), 10)),
                Cell::from(text::align_right(&r.total.format_money(), 14)),
            ])
        })
        .collect::<Vec<_>>();

    let table = Table::new(rows)
        .header(header)
        .block(block)
        .widths(&WIDTHS)
        .column_spacing(1);
    frame.render_widget(table, rect);
}
