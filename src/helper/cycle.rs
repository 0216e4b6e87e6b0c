//! Wrapping cursor movement for tables and lists.

pub fn prev(idx: Option<usize>, all: usize) -> Option<usize> {
    match idx {
        Some(idx) if idx < all => idx.checked_sub(1).or_else(|| all.checked_sub(1)),
        _ => all.checked_sub(1),
    }
}

pub fn next(idx: Option<usize>, all: usize) -> Option<usize> {
    match idx {
        Some(idx) if idx + 1 < all => Some(idx + 1),
        _ => (all > 0).then_some(0),
    }
}

/// Like [`prev`], but moving up from the first row leaves the list (back to the input line)
pub fn prev_opt(idx: Option<usize>, all: usize) -> Option<usize> {
    match idx {
        Some(0) => None,
        Some(idx) => idx.min(all).checked_sub(1),
        None => all.checked_sub(1),
    }
}

/// Like [`next`], but moving down from the last row leaves the list
pub fn next_opt(idx: Option<usize>, all: usize) -> Option<usize> {
    match idx {
        Some(idx) if idx + 1 < all => Some(idx + 1),
        Some(_) => None,
        None => (all > 0).then_some(0),
    }
}

/// Keep a selection inside a list that may have shrunk
pub fn clamp(idx: Option<usize>, all: usize) -> Option<usize> {
    idx.and_then(|idx| all.checked_sub(1).map(|last| idx.min(last)))
}
