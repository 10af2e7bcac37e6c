//! Mock ProxmoxClient for unit testing
//!
//! Serves a canned inventory (or a canned failure) without a running cluster
//! and counts how often the inventory was requested.

use crate::error::ProxmoxError;
use crate::models::{ClusterResource, VersionInfo};
use crate::proxmox_trait::ProxmoxClientTrait;
use std::sync::{Arc, Mutex, PoisonError};

/// Mock ProxmoxClient for testing
#[derive(Debug, Clone)]
pub struct MockProxmoxClient {
    base_url: String,
    inventory: Arc<Mutex<Vec<ClusterResource>>>,
    // Status code to fail with instead of serving the inventory
    failure: Arc<Mutex<Option<u16>>>,
    inventory_calls: Arc<Mutex<usize>>,
}

impl MockProxmoxClient {
    /// Create a new mock client with an empty inventory
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            inventory: Arc::new(Mutex::new(Vec::new())),
            failure: Arc::new(Mutex::new(None)),
            inventory_calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Replace the inventory served by `cluster_resources`
    pub fn set_inventory(&self, resources: Vec<ClusterResource>) {
        *self.inventory.lock().unwrap_or_else(PoisonError::into_inner) = resources;
    }

    /// Make every call fail with an API error carrying `status`
    pub fn fail_with_status(&self, status: u16) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(status);
    }

    /// How many times `cluster_resources` was called
    pub fn inventory_calls(&self) -> usize {
        *self.inventory_calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_failure(&self) -> Result<(), ProxmoxError> {
        match *self.failure.lock().unwrap_or_else(PoisonError::into_inner) {
            Some(status) => Err(ProxmoxError::Api {
                status,
                body: "mock failure".to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl ProxmoxClientTrait for MockProxmoxClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn cluster_resources(&self) -> Result<Vec<ClusterResource>, ProxmoxError> {
        *self.inventory_calls.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        self.check_failure()?;
        Ok(self.inventory.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    async fn version(&self) -> Result<VersionInfo, ProxmoxError> {
        self.check_failure()?;
        Ok(VersionInfo {
            version: "8.2.4".to_string(),
            release: Some("8.2".to_string()),
            repoid: None,
        })
    }
}
