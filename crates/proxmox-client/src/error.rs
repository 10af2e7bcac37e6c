//! Proxmox client errors

use thiserror::Error;

/// Errors that can occur when interacting with the Proxmox VE API
#[derive(Debug, Error)]
pub enum ProxmoxError {
    /// HTTP request/response error (connection refused, TLS, timeout)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Proxmox answered with a status other than 200
    #[error("Proxmox API error: {status} - {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body, as returned
        body: String,
    },

    /// The response body did not have the expected `{"data": ...}` shape
    #[error("Failed to decode Proxmox response: {0}")]
    Decode(String),

    /// Client could not be built from the given settings
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
