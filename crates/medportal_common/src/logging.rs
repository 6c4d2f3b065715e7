//! Logging utilities for the MedPortal application.
//!
//! All crates log through `tracing`; this module installs the subscriber once
//! at startup.

use medportal_config::LoggingConfig;
use tracing::{error, info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_FILE_PREFIX: &str = "medportal.log";

/// Initialize the tracing subscriber at INFO.
///
/// # Examples
///
/// ```
/// use medportal_common::logging;
///
/// logging::init();
/// logging::init_with_level(tracing::Level::DEBUG); // no-op, already initialised
/// ```
pub fn init() {
    init_with_level(Level::INFO);
}

/// Initialize the tracing subscriber with a specific log level.
///
/// `RUST_LOG` directives are honoured in addition to `level`.
pub fn init_with_level(level: Level) {
    let result = tracing_subscriber::registry()
        .with(stdout_layer())
        .with(env_filter(level))
        .try_init();

    // try_init fails when a subscriber is already installed (tests, repeated init)
    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
}

/// Initialize logging from the `[logging]` configuration section.
///
/// When `directory` is set, a daily rolling file is written next to stdout. The
/// returned guard flushes the file writer on drop and must be held for the
/// lifetime of the process.
pub fn init_from_config(config: &LoggingConfig) -> Option<WorkerGuard> {
    let level = config.level.parse::<Level>().unwrap_or(Level::INFO);

    let (file_layer, guard) = match config.directory.as_deref() {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let result = tracing_subscriber::registry()
        .with(stdout_layer())
        .with(file_layer)
        .with(env_filter(level))
        .try_init();

    if result.is_ok() {
        info!(
            "Logging initialized at level: {} (file output: {})",
            level,
            config.directory.as_deref().unwrap_or("disabled")
        );
    }
    guard
}

fn stdout_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
}

fn env_filter(level: Level) -> EnvFilter {
    let filter = EnvFilter::from_default_env();
    match format!("medportal={}", level).parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

/// Log a result, with different messages for success and error cases.
///
/// Returns the original result, allowing this function to be used in a chain.
pub fn log_result<T, E: std::fmt::Display>(
    result: Result<T, E>,
    success_message: &str,
    error_context: &str,
) -> Result<T, E> {
    match &result {
        Ok(_) => info!("{}", success_message),
        Err(e) => error!("{}: {}", error_context, e),
    }
    result
}
