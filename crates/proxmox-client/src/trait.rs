//! ProxmoxClient trait for mocking
//!
//! The provisioning loop holds a `Box<dyn ProxmoxClientTrait>`, so tests can
//! swap the HTTP client for [`crate::MockProxmoxClient`].

use crate::error::ProxmoxError;
use crate::models::{ClusterResource, VersionInfo};

/// Trait for Proxmox API client operations
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait ProxmoxClientTrait: Send + Sync {
    /// Get the base URL
    fn base_url(&self) -> &str;

    /// Fetch the cluster resource inventory
    async fn cluster_resources(&self) -> Result<Vec<ClusterResource>, ProxmoxError>;

    /// Fetch the API version (connectivity/credential check)
    async fn version(&self) -> Result<VersionInfo, ProxmoxError>;
}
