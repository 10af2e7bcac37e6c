//! GuacamoleClient trait for mocking

use crate::error::GuacamoleError;
use crate::models::ConnectionProfile;

/// Trait for Guacamole REST API operations
#[async_trait::async_trait]
pub trait GuacamoleClientTrait: Send + Sync {
    /// Get the base URL
    fn base_url(&self) -> &str;

    /// Create a connection profile; `Ok` only on HTTP 200
    async fn create_connection(&self, profile: &ConnectionProfile) -> Result<(), GuacamoleError>;
}
