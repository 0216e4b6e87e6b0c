pub mod account;
pub mod fallback;
pub mod loadable;
pub mod types;

pub use account::*;
pub use fallback::sample_quotes;
pub use loadable::{Cached, Loadable, Versioned};
pub use types::*;
