use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, Paragraph, Sparkline, Tabs},
    Frame,
};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use strum::IntoEnumIterator;

use crate::data::{ChartInterval, Fundamentals, Loadable};
use crate::helper::{format_volume, DecimalExt, Sign};
use crate::state::Dashboard;
use crate::ui::{styles, text};

/// Sparkline height resolution
const CHART_STEPS: u64 = 100;

pub fn render(frame: &mut Frame, rect: Rect, dashboard: &Dashboard) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(1),
        ])
        .split(rect);

    heading(frame, chunks[0], dashboard);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(34), Constraint::Min(20)])
        .split(chunks[1]);
    fundamentals(frame, body[0], dashboard);
    chart(frame, body[1], dashboard);

    let wallet = match dashboard.wallet() {
        Loadable::Ready(wallet) => t!(
            "stock.Available",
            amount = format!("{} {}", wallet.balance.format_money(), wallet.currency)
        ).to_string(),
        _ => String::new(),
    };
    let hints = Paragraph::new(Line::from(vec![
        Span::styled(wallet, styles::gray()),
        Span::styled(format!("  {}", t!("stock.Keys").to_string()), styles::dark_gray()),
    ]));
    frame.render_widget(hints, chunks[2]);
}

fn heading(frame: &mut Frame, rect: Rect, dashboard: &Dashboard) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::border());
    let Some(selected) = dashboard.instrument() else {
        // details for a symbol no list knows are still on their way
        let line = match dashboard.symbol() {
            Some(symbol) => Line::from(vec![
                Span::styled(format!("{symbol} "), styles::title()),
                Span::styled(t!("Loading").to_string(), styles::dark_gray()),
            ]),
            None => Line::from(t!("stock.NoSelection").to_string()),
        };
        frame.render_widget(Paragraph::new(line).block(block), rect);
        return;
    };

    let favorites = dashboard.favorites();
    let star = if favorites.is_pending(&selected.symbol) {
        Span::styled("…", styles::dark_gray())
    } else if favorites.set().contains(&selected.symbol) {
        Span::styled("★", styles::favorite())
    } else {
        Span::styled("☆", styles::dark_gray())
    };
    let style = styles::up(selected.change_percent.sign());
    let line = Line::from(vec![
        Span::styled(format!("{} ", selected.symbol), styles::title()),
        Span::styled(format!("{}  ", selected.name), styles::text()),
        Span::styled(format!("{}  ", selected.price.format_price()), style),
        Span::styled(format!("{}  ", selected.change_percent.format_percent()), style),
        star,
    ]);
    frame.render_widget(Paragraph::new(line).block(block), rect);
}

fn fundamentals(frame: &mut Frame, rect: Rect, dashboard: &Dashboard) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border())
        .title(Span::styled(format!(" {} ", t!("stock.Overview").to_string()), styles::title()));

    let details = dashboard.details();
    let Some(details) = details.ready() else {
        if let Some(placeholder) = super::placeholder(details) {
            frame.render_widget(placeholder.block(block), rect);
        }
        return;
    };

    frame.render_widget(List::new(fundamental_items(&details.fundamentals)).block(block), rect);
}

fn fundamental_items(f: &Fundamentals) -> Vec<ratatui::widgets::ListItem<'static>> {
    let price = |v: Option<Decimal>| v.map_or_else(|| "--".to_string(), |v| v.format_price());
    vec![
        styles::item(t!("stock.Open").to_string(), price(f.open)),
        styles::item(t!("stock.High").to_string(), price(f.high)),
        styles::item(t!("stock.Low").to_string(), price(f.low)),
        styles::item(t!("stock.PrevClose").to_string(), price(f.prev_close)),
        styles::item(
            t!("stock.Volume").to_string(),
            f.volume.map_or_else(|| "--".to_string(), format_volume),
        ),
        styles::item(
            t!("stock.MarketCap").to_string(),
            f.market_cap
                .map_or_else(|| "--".to_string(), |v| text::unit(v, 2)),
        ),
        styles::item(
            t!("stock.PE").to_string(),
            f.pe_ratio
                .map_or_else(|| "--".to_string(), |v| v.round_dp(2).to_string()),
        ),
        styles::item(t!("stock.High52w").to_string(), price(f.week52_high)),
        styles::item(t!("stock.Low52w").to_string(), price(f.week52_low)),
    ]
}

fn chart(frame: &mut Frame, rect: Rect, dashboard: &Dashboard) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3)])
        .split(rect);

    let intervals: Vec<ChartInterval> = ChartInterval::iter().collect();
    let selected = intervals
        .iter()
        .position(|i| *i == dashboard.interval())
        .unwrap_or_default();
    let tabs = Tabs::new(
        intervals
            .iter()
            .map(|i| Line::from(format!(" {} ", i.as_param())))
            .collect(),
    )
    .style(styles::dark_gray())
    .highlight_style(styles::text_selected())
    .divider(" ")
    .select(selected);
    frame.render_widget(tabs, chunks[0]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border())
        .title(Span::styled(format!(" {} [ ] ", t!("stock.Chart").to_string()), styles::title()));
    let candles = dashboard.chart();
    let Some(candles) = candles.ready() else {
        if let Some(placeholder) = super::placeholder(candles) {
            frame.render_widget(placeholder.block(block), chunks[1]);
        }
        return;
    };

    let closes = crate::api::quote::closes(candles);
    let trend = match (closes.first(), closes.last()) {
        (Some(first), Some(last)) => last.cmp(first),
        _ => std::cmp::Ordering::Equal,
    };
    let points = sparkline_points(&closes);
    let sparkline = Sparkline::default()
        .block(block)
        .data(&points)
        .max(CHART_STEPS)
        .style(styles::up(trend));
    frame.render_widget(sparkline, chunks[1]);
}

/// Scale closes into `1..=CHART_STEPS` so a flat line is still visible
fn sparkline_points(closes: &[Decimal]) -> Vec<u64> {
    let (Some(min), Some(max)) = (closes.iter().min(), closes.iter().max()) else {
        return vec![];
    };
    let range = *max - *min;
    let steps = Decimal::from(CHART_STEPS - 1);
    closes
        .iter()
        .map(|close| {
            if range.is_zero() {
                return 1;
            }
            ((*close - *min) / range * steps).round().to_u64().unwrap_or(0) + 1
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::sparkline_points;
    use rust_decimal_macros::dec;

    #[test]
    fn sparkline_spans_full_height() {
        let points = sparkline_points(&[dec!(10), dec!(15), dec!(20)]);
        assert_eq!(points, vec![1, 51, 100]);
    }

    #[test]
    fn flat_series_stays_visible() {
        assert_eq!(sparkline_points(&[dec!(3), dec!(3)]), vec![1, 1]);
        assert!(sparkline_points(&[]).is_empty());
    }
}
