//! EdgeRouter trait for mocking
//!
//! The router step only needs "install this static mapping"; the SSH
//! session handling stays behind this seam so tests can use
//! [`crate::MockEdgeRouter`].

use crate::error::EdgeOsError;
use crate::models::StaticMapping;

/// Router operations used by the provisioning loop
#[async_trait::async_trait]
pub trait EdgeRouter: Send + Sync {
    /// Router host name or address, for log lines
    fn host(&self) -> &str;

    /// Install a DHCP static mapping
    async fn set_static_mapping(&self, mapping: &StaticMapping) -> Result<(), EdgeOsError>;
}
