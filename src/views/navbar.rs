use ratatui::{
    prelude::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Paragraph, Tabs},
    Frame,
};

use crate::{app::AppState, data::Session, ui::styles};

pub fn render(frame: &mut Frame, rect: Rect, state: AppState, session: &Session) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rect);

    let tabs = vec![
        Line::from(format!(" {} [1] ", t!("tabs.Market").to_string())),
        Line::from(format!(" {} [2] ", t!("tabs.Portfolio").to_string())),
    ];
    let tabs = Tabs::new(tabs)
        .style(styles::text())
        .highlight_style(styles::text_selected())
        .divider("|")
        .select(match state {
            AppState::Portfolio => 1,
            _ => 0,
        });

    let dark_gray = styles::dark_gray();
    let name = match session.user() {
        Some(user) => Span::styled(t!("Welcome, %{name}", name = user.username).to_string(), styles::text()),
        None => Span::styled(t!("Guest").to_string(), dark_gray),
    };
    let user_info = Paragraph::new(Line::from(vec![
        name,
        Span::styled(" | ", dark_gray),
        Span::styled(t!("Keyboard.Help").to_string(), dark_gray),
        Span::raw(" "),
        Span::styled(t!("Keyboard.Search").to_string(), dark_gray),
        Span::raw(" "),
        Span::styled(t!("Keyboard.Refresh").to_string(), dark_gray),
        Span::raw(" "),
        Span::styled(t!("Keyboard.Quit").to_string(), dark_gray),
    ]))
    .alignment(Alignment::Right);

    frame.render_widget(tabs, chunks[0]);
    frame.render_widget(user_info, chunks[1]);
}
