//! Controller-specific error types.
//!
//! Only startup can fail the process: once the loop runs, collaborator
//! errors are logged and turned into step outcomes instead.

use guacamole_client::GuacamoleError;
use proxmox_client::ProxmoxError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can stop the controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Configuration file could not be read
    #[error("Cannot read configuration {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration file is not valid YAML for the expected shape
    #[error("Cannot parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// Configuration parsed but is unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Logging could not be set up
    #[error("Logging setup failed: {0}")]
    Logging(String),

    /// Proxmox client construction error
    #[error("Proxmox error: {0}")]
    Proxmox(#[from] ProxmoxError),

    /// Guacamole client construction error
    #[error("Guacamole error: {0}")]
    Guacamole(#[from] GuacamoleError),
}
