use ratatui::layout::{Margin, Rect};

/// A `width` x `height` box in the middle of `r`; `0` keeps the full extent
pub fn centered(width: u16, height: u16, r: Rect) -> Rect {
    let horizontal = if width == 0 {
        0
    } else {
        r.width.saturating_sub(width) / 2
    };
    let vertical = if height == 0 {
        0
    } else {
        r.height.saturating_sub(height) / 2
    };
    r.inner(&Margin {
        horizontal,
        vertical,
    })
}

/// Split a screen into navbar, body and footer rows
pub fn frame_rows(r: Rect) -> (Rect, Rect, Rect) {
    let top = Rect { height: 1.min(r.height), ..r };
    let bottom = Rect {
        y: r.y + r.height.saturating_sub(1),
        height: 1.min(r.height),
        ..r
    };
    let body = Rect {
        y: r.y + 1,
        height: r.height.saturating_sub(2),
        ..r
    };
    (top, body, bottom)
}
