//! Logging setup: stdout plus an optional plain-text log file.

use crate::config::LoggingSettings;
use crate::error::ControllerError;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// `RUST_LOG` wins over the configured level
fn build_filter(level: &str) -> Result<EnvFilter, ControllerError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| ControllerError::Logging(format!("invalid log level {:?}: {}", level, e)))
}

fn open_log_file(path: &Path) -> Result<File, ControllerError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            ControllerError::Logging(format!("cannot open log file {}: {}", path.display(), e))
        })
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init(settings: &LoggingSettings) -> Result<(), ControllerError> {
    let filter = build_filter(&settings.level)?;

    let file_layer = match &settings.file {
        Some(path) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(open_log_file(path)?)),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()
        .map_err(|e| ControllerError::Logging(e.to_string()))
}
