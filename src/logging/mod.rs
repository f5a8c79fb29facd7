/*!
 * Logging Module
 * Subscriber setup and request logging
 */
pub mod middleware;

use std::io;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

const LOG_DIR: &str = "logs";

/// `RUST_LOG` wins; otherwise `LOG_LEVEL` for this crate, debug in development.
fn env_filter(is_production: bool) -> EnvFilter {
    let level = std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| if is_production { "info" } else { "debug" }.to_string());

    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "innovara_site={},tower_http=debug,axum=info,sqlx=warn",
            level
        ))
    })
}

/// Install the global subscriber: console plus a daily `logs/app.log`, and
/// in production JSON everywhere with errors copied to `logs/error.log`.
///
/// The returned guards flush the background writers; hold them for the
/// lifetime of the process.
pub fn init(environment: &str) -> Vec<WorkerGuard> {
    let is_production = environment == "production";

    std::fs::create_dir_all(LOG_DIR).ok();

    let (file_writer, file_guard) = non_blocking(rolling::daily(LOG_DIR, "app.log"));
    let (console_writer, console_guard) = non_blocking(io::stdout());
    let mut guards = vec![file_guard, console_guard];

    let registry = tracing_subscriber::registry().with(env_filter(is_production));

    if is_production {
        let (error_writer, error_guard) = non_blocking(rolling::daily(LOG_DIR, "error.log"));
        guards.push(error_guard);

        let file_layer = fmt::layer()
            .json()
            .with_writer(file_writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        let error_layer = fmt::layer()
            .json()
            .with_writer(error_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(LevelFilter::ERROR);

        let console_layer = fmt::layer()
            .json()
            .with_writer(console_writer)
            .with_target(false);

        registry
            .with(file_layer)
            .with(error_layer)
            .with(console_layer)
            .init();
    } else {
        let file_layer = fmt::layer()
            .with_writer(file_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false);

        let console_layer = fmt::layer()
            .with_writer(console_writer)
            .with_target(true)
            .pretty();

        registry.with(file_layer).with(console_layer).init();
    }

    tracing::info!(environment = %environment, "logging initialized");

    guards
}
