//! Logging setup for modcon binaries.

pub mod event_layer;

use std::path::PathBuf;

use modcon_core::error::{ModconError, Result};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub use event_layer::{ConsoleEvent, ConsoleEventLayer};

/// Default filter when neither `--log-level` nor `RUST_LOG` is set.
pub const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Default)]
pub struct LogOptions {
    /// Explicit filter directive; takes precedence over `RUST_LOG`.
    pub level: Option<String>,
    /// Directory for the daily-rolling log file. No file logging when unset.
    pub log_dir: Option<PathBuf>,
    /// Receives lifecycle events from modcon crates.
    pub events: Option<mpsc::UnboundedSender<ConsoleEvent>>,
}

fn build_filter(level: Option<&str>) -> Result<EnvFilter> {
    match level {
        Some(level) => EnvFilter::try_new(level)
            .map_err(|e| ModconError::config(format!("Invalid log level '{level}': {e}"))),
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))),
    }
}

/// Installs the global subscriber.
///
/// Returns the file writer's guard when file logging is on; it must be held
/// until exit so buffered lines are flushed.
pub fn init_logging(options: LogOptions) -> Result<Option<WorkerGuard>> {
    let filter = build_filter(options.level.as_deref())?;

    let (file_layer, guard) = match &options.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, "modcon.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .with(options.events.map(ConsoleEventLayer::new))
        .try_init()
        .map_err(|e| ModconError::internal(format!("Failed to install logger: {e}")))?;

    tracing::debug!("[Telemetry] Logging initialised");
    Ok(guard)
}
