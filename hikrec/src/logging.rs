//! Logging setup for applications embedding hikrec
//!
//! The library only emits `tracing` events. Applications that have no
//! subscriber of their own can install one here.

use tracing_subscriber::{fmt, EnvFilter, Registry};

/// How much output to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingMode {
    /// Install nothing; events are dropped
    Silent,
    /// Compact stderr output at info level
    Development,
    /// Verbose output with thread ids and source locations
    Debug,
}

/// Logging configuration error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),
}

/// Install a global subscriber for the given mode
///
/// # Environment Variables
///
/// - `HIKREC_LOG_LEVEL`: filter directive, e.g. `hikrec=debug,soap_client=trace`
/// - `RUST_LOG`: used when `HIKREC_LOG_LEVEL` is not set
///
/// ```rust,no_run
/// use hikrec::logging::{init_logging, LoggingMode};
///
/// init_logging(LoggingMode::Development).expect("logging");
/// ```
pub fn init_logging(mode: LoggingMode) -> Result<(), LoggingError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    match mode {
        LoggingMode::Silent => Ok(()),
        LoggingMode::Development => {
            let filter = env_filter("info")?;

            Registry::default()
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_writer(std::io::stderr)
                        .compact(),
                )
                .with(filter)
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
        LoggingMode::Debug => {
            let filter = env_filter("debug")?;

            Registry::default()
                .with(
                    fmt::layer()
                        .pretty()
                        .with_writer(std::io::stderr)
                        .with_thread_names(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .with(filter)
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
    }
}

/// Install a subscriber chosen by `HIKREC_LOG_MODE`
///
/// Accepts `silent`, `development` or `debug`; anything else means silent.
pub fn init_logging_from_env() -> Result<(), LoggingError> {
    init_logging(mode_from_str(std::env::var("HIKREC_LOG_MODE").ok().as_deref()))
}

/// Whether some global subscriber is already installed
pub fn is_initialized() -> bool {
    tracing::dispatcher::has_been_set()
}

fn mode_from_str(value: Option<&str>) -> LoggingMode {
    match value.map(str::trim) {
        Some(v) if v.eq_ignore_ascii_case("development") => LoggingMode::Development,
        Some(v) if v.eq_ignore_ascii_case("debug") => LoggingMode::Debug,
        _ => LoggingMode::Silent,
    }
}

fn env_filter(default_level: &str) -> Result<EnvFilter, LoggingError> {
    let directives = std::env::var("HIKREC_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| default_level.to_string());

    EnvFilter::try_new(&directives)
        .map_err(|e| LoggingError::InvalidFilter(format!("{}: {}", directives, e)))
}
