mod loading;
mod quantity;
mod search;
mod terminal;

pub use loading::{Loading, LoadingWidget};
pub use quantity::QuantityInput;
pub use search::{SearchAction, SearchBox};
pub use terminal::Terminal;
