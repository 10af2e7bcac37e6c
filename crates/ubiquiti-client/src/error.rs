//! EdgeOS client errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EdgeOsError {
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    #[error("SSH key error: {0}")]
    Keys(#[from] russh_keys::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Authentication failed for {user}@{host}")]
    Authentication { user: String, host: String },

    #[error("Host key rejected for {host}:{port}: {reason}")]
    HostKeyRejected {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("Command exited with status {status}: {stderr}")]
    CommandFailed { status: u32, stderr: String },

    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    #[error("Invalid static mapping: {0}")]
    InvalidMapping(String),
}
