use ratatui::widgets::Paragraph;

use crate::data::Loadable;
use crate::ui::styles;

pub mod footer;
pub mod help;
pub mod market;
pub mod navbar;
pub mod popup;
pub mod portfolio;
pub mod stock;

/// Inline message for a slot with nothing to show yet, `None` once data is ready
pub fn placeholder<T>(state: &Loadable<T>) -> Option<Paragraph<'static>> {
    match state {
        Loadable::Ready(_) => None,
        Loadable::Idle | Loadable::Loading => {
            Some(Paragraph::new(t!("Loading").to_string()).style(styles::dark_gray()))
        }
        Loadable::Empty => Some(Paragraph::new(t!("Empty").to_string()).style(styles::dark_gray())),
        Loadable::Failed(err) => Some(
            Paragraph::new(t!("LoadFailed", error = err).to_string())
                .style(styles::error())
                .wrap(ratatui::widgets::Wrap { trim: true }),
        ),
    }
}
