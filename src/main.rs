use crate::widgets::Terminal;
use std::io::{IsTerminal, Write};

#[macro_use]
mod macros;

pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod doctor;
pub mod error;
pub mod favorites;
pub mod helper;
pub mod logger;
pub mod path_env;
pub mod render;
pub mod resolver;
pub mod search;
pub mod state;
pub mod system;
pub mod trade;
pub mod ui;
pub mod widgets;

mod views;

#[cfg(test)]
mod testkit;

#[macro_use]
extern crate rust_i18n;
i18n!("locales", fallback = "en");

#[tokio::main]
async fn main() {
    let bin_name = std::env::args()
        .next()
        .unwrap_or_else(|| "stocksim".to_string());

    let command = match cli::parse_args(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("{}", err.message);
            std::process::exit(err.code);
        }
    };

    dotenvy::dotenv().ok();

    let args = match command {
        cli::Command::Help => {
            println!("{}", cli::help_text(&bin_name));
            return;
        }
        cli::Command::Version => {
            println!("{}", cli::version_text());
            return;
        }
        cli::Command::Doctor => std::process::exit(doctor::run()),
        cli::Command::Run(args) => args,
    };

    if !std::io::stdout().is_terminal() {
        eprintln!("Stock Sim Terminal must run in an interactive terminal (TTY).");
        std::process::exit(1);
    }

    let config = match config::Config::from_env(args.api_url.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            config::print_config_guide();
            eprintln!("\n{err}");
            std::process::exit(2);
        }
    };

    rust_i18n::set_locale(&config.locale);

    let _guard = logger::init();
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = std::process::id(),
        locale = %config.locale,
        api_url = %config.api_url,
        authenticated = config.token.is_some(),
        log_dir = %logger::active_log_dir().display(),
        "starting"
    );

    let backend = match api::HttpBackend::new(
        config.api_url.clone(),
        config.token.clone(),
        config.timeout,
    ) {
        Ok(backend) => backend,
        Err(err) => {
            eprintln!("\nFailed to create HTTP client: {err}");
            tracing::error!(error = %err, "http client init failed");
            std::process::exit(2);
        }
    };

    Terminal::restore_on_panic();

    let _ = std::io::stdout().write_all(b"\n");
    let _ = std::io::stdout().flush();

    Terminal::enter_full_screen();
    scopeguard::defer! {
        Terminal::exit_full_screen();
    }

    tokio::select! {
        result = app::run(&config, api::Api::new(backend)) => {
            match result {
                Ok(()) => tracing::info!("main loop finished"),
                Err(err) => tracing::error!(error = %err, "main loop failed"),
            }
        }
        () = wait_for_shutdown_signal() => {
            tracing::warn!("shutdown signal received");
        }
    }
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use std::future::pending;
    use tokio::signal::unix::{signal, Signal, SignalKind};

    async fn recv_or_pending(signal: Option<Signal>) {
        let mut signal = signal;
        if let Some(sig) = signal.as_mut() {
            let _ = sig.recv().await;
            return;
        }
        pending::<()>().await;
    }

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        () = recv_or_pending(signal(SignalKind::terminate()).ok()) => {}
        () = recv_or_pending(signal(SignalKind::hangup()).ok()) => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
