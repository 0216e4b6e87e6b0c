use std::sync::atomic::{AtomicU8, Ordering};

use bevy_ecs::{prelude::Component, system::Resource};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    widgets::{Paragraph, Widget},
};

const FRAMES: [char; 4] = ['◰', '◳', '◲', '◱'];

/// Spinner shown while the session is being detected
#[derive(Debug, Default, Resource, Component)]
pub struct Loading {
    tick: AtomicU8,
}

#[derive(Clone, Debug, Default)]
pub struct LoadingWidget {
    frame: char,
    label: String,
}

impl From<&Loading> for LoadingWidget {
    fn from(loading: &Loading) -> Self {
        let tick = loading.tick.fetch_add(1, Ordering::Relaxed);
        Self {
            frame: FRAMES[usize::from(tick) % FRAMES.len()],
            label: t!("Loading").to_string(),
        }
    }
}

impl Widget for LoadingWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let text = format!("{} {}", self.frame, self.label);
        let width = u16::try_from(unicode_width::UnicodeWidthStr::width(text.as_str()))
            .unwrap_or(area.width);
        let area = crate::ui::rect::centered(width, 1, area);
        Paragraph::new(text).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::{Loading, LoadingWidget, FRAMES};

    #[test]
    fn spinner_advances_each_frame() {
        let loading = Loading::default();
        let first = LoadingWidget::from(&loading);
        let second = LoadingWidget::from(&loading);
        assert_eq!(first.frame, FRAMES[0]);
        assert_eq!(second.frame, FRAMES[1]);
    }
}
