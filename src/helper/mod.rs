pub mod cycle;
pub mod decimal_ext;
pub mod number;

pub use decimal_ext::DecimalExt;
pub use number::{format_volume, Sign};

/// Tests that switch the global locale hold this lock
#[cfg(test)]
pub static TEST_LOCALE_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
