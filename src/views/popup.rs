use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

use rust_decimal::Decimal;

use crate::app::Popup;
use crate::data::Loadable;
use crate::helper::{DecimalExt, Sign};
use crate::state::{Dashboard, Notice};
use crate::trade::{TradePanel, TradePhase};
use crate::ui::styles;
use crate::widgets::{QuantityInput, SearchBox};

/// Popups stack in this order: help or search, then the trade panel, then a notice
pub fn render(
    frame: &mut Frame,
    rect: Rect,
    popup: Popup,
    dashboard: &Dashboard,
    search: &mut SearchBox,
    quantity: &QuantityInput,
) {
    match popup {
        Popup::Help => super::help::render(frame, rect),
        Popup::Search => searching(frame, rect, dashboard, search),
        Popup::None => {}
    }
    if let Some(panel) = dashboard.trade().panel() {
        trade_panel(frame, rect, panel, dashboard, quantity);
    }
    if let Some(notice) = dashboard.notice() {
        notice_box(frame, rect, notice);
    }
}

fn safe_cursor_x(chunk_x: u16, visual_cursor: usize) -> u16 {
    let offset = u16::try_from(visual_cursor).unwrap_or(u16::MAX - 1);
    chunk_x.saturating_add(offset).saturating_add(1)
}

fn searching(frame: &mut Frame, rect: Rect, dashboard: &Dashboard, search: &mut SearchBox) {
    const MAX_SIZE: (u16, u16) = (60, 24);
    let rect = crate::ui::rect::centered(MAX_SIZE.0, MAX_SIZE.1, rect);
    frame.render_widget(Clear, rect);

    let chunks = Layout::default()
        .margin(1)
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Percentage(100)].as_ref())
        .split(rect);

    let input = &search.input;
    let paragraph = Paragraph::new(input.value()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(styles::border())
            .title(t!("SearchStock.title").to_string()),
    );
    frame.render_widget(paragraph, chunks[0]);
    frame.set_cursor(
        safe_cursor_x(chunks[0].x, input.visual_cursor()),
        chunks[0].y + 1,
    );

    let list_block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border())
        .title(if search.query().trim().is_empty() {
            t!("SearchStock.recent").to_string()
        } else {
            String::new()
        });

    let results = dashboard.search().state();
    let options = search.options(dashboard);
    if options.is_empty() && !search.query().trim().is_empty() {
        let message = match results {
            Loadable::Failed(err) => Paragraph::new(t!("LoadFailed", error = err).to_string()).style(styles::error()),
            Loadable::Loading => Paragraph::new(t!("Searching").to_string()).style(styles::dark_gray()),
            Loadable::Empty => Paragraph::new(t!("SearchStock.empty").to_string()).style(styles::dark_gray()),
            _ => Paragraph::new(t!("SearchStock.hint").to_string()).style(styles::dark_gray()),
        };
        frame.render_widget(message.block(list_block), chunks[1]);
        return;
    }

    let rows = options
        .iter()
        .map(|quote| {
            let style = styles::up(quote.change_percent.sign());
            Row::new(vec![
                Cell::from(Span::styled(quote.symbol.to_string(), styles::popup())),
                Cell::from(quote.display_name().to_string()),
                Cell::from(quote.price.format_price()).style(style),
                Cell::from(quote.change_percent.format_percent()).style(style),
            ])
        })
        .collect::<Vec<_>>();

    let widths = [
        Constraint::Length(8),
        Constraint::Min(16),
        Constraint::Length(10),
        Constraint::Length(8),
    ];
    let table = Table::new(rows)
        .block(list_block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .widths(&widths)
        .column_spacing(1);
    frame.render_stateful_widget(table, chunks[1], &mut search.table);
}

fn trade_panel(
    frame: &mut Frame,
    rect: Rect,
    panel: &TradePanel,
    dashboard: &Dashboard,
    quantity: &QuantityInput,
) {
    let rect = crate::ui::rect::centered(46, 15, rect);
    frame.render_widget(Clear, rect);

    let side = styles::side(panel.side);
    let title = format!(
        " {} {} ",
        t!(format!("side.{}", panel.side.path())).to_string(),
        panel.symbol
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(side)
        .title(Span::styled(title, side.add_modifier(Modifier::BOLD)));
    let inner = block.inner(rect);
    frame.render_widget(block, rect);

    let intent = panel.intent().ok();
    let amount =
        |value: Option<Decimal>| value.map_or_else(|| "--".to_string(), |v| v.format_money());
    let row = |label: String, value: String| {
        Line::from(vec![
            Span::styled(format!("{label:<14}"), styles::label()),
            Span::styled(value, styles::text()),
        ])
    };

    let mut lines = vec![
        Line::styled(panel.name.clone(), styles::gray()),
        Line::from(""),
        row(t!("trade.Price").to_string(), panel.price.format_price()),
        row(t!("trade.Quantity").to_string(), quantity.value().to_string()),
        row(t!("trade.Notional").to_string(), amount(intent.as_ref().map(|i| i.notional()))),
        row(t!("trade.Fee").to_string(), amount(intent.as_ref().map(|i| i.fee))),
        row(t!("trade.Total").to_string(), amount(intent.as_ref().map(|i| i.total()))),
    ];
    if let Loadable::Ready(wallet) = dashboard.wallet() {
        lines.push(row(
            t!("trade.Available").to_string(),
            format!("{} {}", wallet.balance.format_money(), wallet.currency),
        ));
    }
    lines.push(Line::from(""));

    match (&panel.error, dashboard.trade().phase()) {
        (_, TradePhase::Confirming) => {
            lines.push(Line::styled(t!("trade.Submitting").to_string(), styles::dark_gray()));
        }
        (Some(err), _) => {
            lines.push(Line::styled(err.to_string(), styles::error()));
            lines.push(Line::styled(t!("trade.Retry").to_string(), styles::dark_gray()));
        }
        (None, _) => lines.push(Line::styled(t!("trade.Keys").to_string(), styles::dark_gray())),
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

    if dashboard.trade().phase() == TradePhase::PanelOpen {
        // quantity line: name, blank, price, quantity
        let x = inner.x + 13;
        frame.set_cursor(
            safe_cursor_x(x, quantity.input.visual_cursor()),
            inner.y + 3,
        );
    }
}

fn notice_box(frame: &mut Frame, rect: Rect, notice: &Notice) {
    let (title, body, style) = match notice {
        Notice::LoginRequired => (
            t!("notice.login.title").to_string(),
            t!("notice.login.content").to_string(),
            styles::text(),
        ),
        Notice::Info(message) => (t!("notice.info").to_string(), message.clone(), styles::text()),
        Notice::Error(message) => (t!("notice.error").to_string(), message.clone(), styles::error()),
    };

    let rect = crate::ui::rect::centered(50, 8, rect);
    frame.render_widget(Clear, rect);
    let lines = vec![
        Line::from(""),
        Line::styled(body, style),
        Line::from(""),
        Line::styled(t!("notice.dismiss").to_string(), styles::dark_gray()),
    ];
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(styles::border_focused())
                .title(Span::styled(format!(" {title} "), styles::title())),
        );
    frame.render_widget(paragraph, rect);
}
