//! Guacamole client errors

use thiserror::Error;

/// Errors from the Guacamole REST API or its database
#[derive(Debug, Error)]
pub enum GuacamoleError {
    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Guacamole answered with a status other than 200
    #[error("Guacamole API error: {status} - {body}")]
    Api { status: u16, body: String },

    /// MySQL error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    /// Client could not be built from the given settings
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
