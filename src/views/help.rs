use ratatui::{
    prelude::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Paragraph},
    Frame,
};

use crate::ui::styles;

pub fn render(frame: &mut Frame, rect: Rect) {
    let rect = crate::ui::rect::centered(70, 26, rect);

    let mut lines = vec![
        Line::from(""),
        Line::styled(
            concat!("Stock Sim Terminal v", env!("CARGO_PKG_VERSION")),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Line::from(""),
    ];
    let tips = t!("HelpTips").to_string();
    lines.extend(tips.lines().map(|line| Line::from(line.to_string())));
    let paragraph = Paragraph::new(lines).style(styles::popup()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(styles::border())
            .padding(Padding::horizontal(2))
            .title(Span::styled(t!("Help").to_string(), styles::title())),
    );
    frame.render_widget(Clear, rect);
    frame.render_widget(paragraph, rect);
}
