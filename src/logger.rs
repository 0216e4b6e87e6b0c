use std::any::Any;
use std::path::PathBuf;

use std::sync::OnceLock;

use crate::path_env;

static ACTIVE_LOG_DIR: OnceLock<PathBuf> = OnceLock::new();

const DEFAULT_FILTER: &str = "error,stocksim=debug";

/// `STOCKSIM_DATA_DIR/logs` if set, otherwise the platform log location
pub fn default_log_dir() -> PathBuf {
    if let Some(dir) = path_env::dir_from_env(path_env::DATA_DIR) {
        return dir.join("logs");
    }
    platform_log_dir().unwrap_or_else(fallback_log_dir)
}

#[cfg(target_os = "macos")]
fn platform_log_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join("Library/Logs/StockSim"))
}

#[cfg(target_os = "windows")]
fn platform_log_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("StockSim\\Logs"))
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn platform_log_dir() -> Option<PathBuf> {
    dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
        .map(|dir| dir.join("stocksim/logs"))
}

pub fn fallback_log_dir() -> PathBuf {
    std::env::temp_dir().join("stocksim").join("logs")
}

#[must_use]
pub fn active_log_dir() -> PathBuf {
    ACTIVE_LOG_DIR
        .get()
        .cloned()
        .unwrap_or_else(default_log_dir)
}

fn local_offset() -> time::UtcOffset {
    time::UtcOffset::current_local_offset().unwrap_or(time::UtcOffset::UTC)
}

/// Install the file subscriber. Keep the returned guard alive until exit so buffered lines flush.
#[must_use]
pub fn init() -> impl Any {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let primary_log_dir = default_log_dir();
    let log_dir = if std::fs::create_dir_all(&primary_log_dir).is_ok() {
        primary_log_dir
    } else {
        let fallback = fallback_log_dir();
        let _ = std::fs::create_dir_all(&fallback);
        fallback
    };

    let _ = ACTIVE_LOG_DIR.set(log_dir.clone());

    let writer = match RollingFileAppender::builder()
        .filename_prefix("stocksim")
        .filename_suffix("log")
        .max_log_files(5)
        .rotation(Rotation::DAILY)
        .build(&log_dir)
    {
        Ok(writer) => writer,
        Err(err) => {
            eprintln!("Failed to open log directory {}: {err}", log_dir.display());
            std::process::exit(1);
        }
    };
    let (writer, guard) = tracing_appender::non_blocking(writer);

    let timer = fmt::time::OffsetTime::new(
        local_offset(),
        time::format_description::well_known::Rfc3339,
    );
    let file_line = cfg!(debug_assertions);

    let subscriber = fmt::layer()
        .with_ansi(false)
        .with_timer(timer)
        .with_thread_ids(true)
        .with_file(file_line)
        .with_line_number(file_line)
        .with_writer(writer);

    let filter = std::env::var("STOCKSIM_LOG").unwrap_or_else(|_| DEFAULT_FILTER.to_string());
    let subscriber = subscriber.with_filter(tracing_subscriber::EnvFilter::new(filter));

    tracing_subscriber::registry().with(subscriber).init();
    guard
}
