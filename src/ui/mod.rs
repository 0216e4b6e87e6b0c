pub mod content;
pub mod rect;
pub mod styles;
pub mod text;
