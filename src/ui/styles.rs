use std::{borrow::Cow, cmp::Ordering};

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::ListItem,
};

/// Which direction is drawn green
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorMode {
    RedUp,
    #[default]
    GreenUp,
}

#[inline]
pub fn header() -> Style {
    Style::default().fg(Color::Gray)
}

#[inline]
pub fn gray() -> Style {
    Style::default().fg(Color::Gray)
}

#[inline]
pub fn dark_gray() -> Style {
    Style::default().fg(Color::DarkGray)
}

#[inline]
pub fn label() -> Style {
    Style::default().fg(Color::Gray)
}

#[inline]
pub fn text() -> Style {
    Style::default().fg(Color::Reset)
}

#[inline]
pub fn text_selected() -> Style {
    text().add_modifier(Modifier::REVERSED)
}

#[inline]
pub fn popup() -> Style {
    text()
}

#[inline]
pub fn title() -> Style {
    text().add_modifier(Modifier::BOLD)
}

#[inline]
pub fn border() -> Style {
    Style::default().fg(Color::DarkGray)
}

#[inline]
pub fn border_focused() -> Style {
    Style::default().fg(Color::Gray)
}

#[inline]
pub fn error() -> Style {
    Style::default().fg(Color::LightRed)
}

#[inline]
pub fn favorite() -> Style {
    Style::default().fg(Color::Yellow)
}

#[inline]
pub fn side(side: crate::data::TradeSide) -> Style {
    match side {
        crate::data::TradeSide::Buy => bull_bear().0,
        crate::data::TradeSide::Sell => bull_bear().1,
    }
}

#[inline]
pub fn up(val: Ordering) -> Style {
    match val {
        Ordering::Less => bull_bear().1,
        Ordering::Equal => Style::default().fg(Color::Reset),
        Ordering::Greater => bull_bear().0,
    }
}

/// Return a style for the currency
#[inline]
pub fn currency(currency: &str) -> Style {
    let color = match currency {
        "USD" => Color::LightBlue,
        "HKD" => Color::LightMagenta,
        "CNY" => Color::LightRed,
        _ => Color::Reset,
    };

    Style::default().fg(color)
}

#[inline]
pub fn color_mode() -> ColorMode {
    ColorMode::GreenUp
}

#[inline]
pub fn bull_bear() -> (Style, Style) {
    let red = Style::default().fg(Color::LightRed);
    let green = Style::default().fg(Color::LightGreen);
    match color_mode() {
        ColorMode::RedUp => (red, green),
        ColorMode::GreenUp => (green, red),
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn item<'a>(name: String, value: impl Into<Cow<'a, str>>) -> ListItem<'a> {
    let spans = Line::from(vec![
        Span::styled(format!("{name}: "), label()),
        Span::styled(value, text()),
    ]);
    ListItem::new(spans)
}

pub fn online() -> Style {
    Style::default().fg(Color::Green)
}

pub fn offline() -> Style {
    Style::default().fg(Color::Red)
}
