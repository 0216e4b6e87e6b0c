use ratatui::{
    prelude::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::{state::Dashboard, ui::styles};

/// Backend host, current list ranking and whether the last market fetch succeeded
pub fn render(frame: &mut Frame, rect: Rect, host: &str, dashboard: &Dashboard) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(80), Constraint::Percentage(20)])
        .split(rect);

    let option = dashboard.list_option();
    let info = Paragraph::new(Line::from(vec![
        Span::styled(format!("{} ", t!("footer.Backend").to_string()), styles::dark_gray()),
        Span::styled(host.to_string(), styles::gray()),
        Span::styled("  |  ", styles::dark_gray()),
        Span::styled(format!("{} ", t!("footer.List").to_string()), styles::dark_gray()),
        Span::styled(t!(format!("list.{}", option.as_param())).to_string(), styles::gray()),
    ]));
    frame.render_widget(info, chunks[0]);

    let hot = dashboard.hot_state();
    let (status, style) = if hot.error().is_some() {
        ("□□□", styles::offline())
    } else if hot.is_loading() {
        ("···", styles::text())
    } else {
        ("■■■", styles::online())
    };
    frame.render_widget(
        Paragraph::new(Span::styled(status, style)).alignment(Alignment::Right),
        chunks[1],
    );
}
