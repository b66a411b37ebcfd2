//!
//! src/logging.rs  Andrew Belles  Oct 16th, 2026
//!
//! Initializes logger and maps pipeline errors onto the severity
//! they should be reported at
//!
//!

use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use tracing_error::ErrorLayer;
use tracing_appender::non_blocking;

use crate::config::{LogFormat, LoggingConfig};
use crate::errors::{ScraperError, Severity};

/// Must be held for the lifetime of the process so buffered lines flush
pub struct LoggingGuard(tracing_appender::non_blocking::WorkerGuard);

pub fn init_logging(cfg: &LoggingConfig) -> Result<LoggingGuard, ScraperError> {
    let (writer, guard) = non_blocking(std::io::stderr());
    let filter = std::env::var("RUST_LOG")
        .ok()
        .map(EnvFilter::new)
        .unwrap_or_else(|| EnvFilter::new(cfg.filter_directives.clone()));

    let time = fmt::time::UtcTime::rfc_3339();
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(ErrorLayer::default());

    let installed = match cfg.format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .with_writer(writer)
                .with_timer(time)
                .with_target(cfg.include_target)
                .with_file(cfg.include_file_line)
                .with_line_number(cfg.include_file_line)
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_span_list(true);
            registry.with(fmt_layer).try_init()
        },
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .with_writer(writer)
                .with_timer(time)
                .with_ansi(cfg.with_ansi)
                .with_target(cfg.include_target)
                .with_file(cfg.include_file_line)
                .with_line_number(cfg.include_file_line)
                .pretty();
            registry.with(fmt_layer).try_init()
        }
    };

    installed.map_err(|e| ScraperError::Config(format!("init logging: {e}")))?;
    Ok( LoggingGuard(guard) )
}

/// Emits `err` at the level its class is reported at
pub fn report(err: &ScraperError, event: &str) {
    let kind = err.kind();
    match err.severity() {
        Severity::Debug    => debug!(kind, error = %err, "{event}"),
        Severity::Info     => info!(kind, error = %err, "{event}"),
        Severity::Warning  => warn!(kind, error = %err, "{event}"),
        Severity::Error    => error!(kind, error = %err, "{event}"),
        Severity::Critical => error!(critical = true, kind, error = %err, "{event}")
    }
}
