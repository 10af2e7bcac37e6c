//! Proxmox VE API models
//!
//! Only the fields the provisioning loop reads are modelled. Everything is
//! optional because `/cluster/resources` mixes VMs, containers, nodes,
//! storage and pools in a single array, and each kind carries a different
//! subset of fields.

use serde::{Deserialize, Serialize};

/// Envelope every Proxmox API response is wrapped in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}

/// One entry of `GET /api2/json/cluster/resources`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterResource {
    /// Resource id, e.g. `qemu/100`
    pub id: Option<String>,
    /// Resource kind: `qemu`, `lxc`, `node`, `storage`, `pool`, `sdn`
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    /// Guest name. Absent for nodes and storage.
    pub name: Option<String>,
    pub node: Option<String>,
    pub vmid: Option<u32>,
    pub status: Option<String>,
}

impl ClusterResource {
    /// Build a resource that only carries a name (convenient for tests and mocks)
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Whether this resource's type is one of `types`.
    ///
    /// An empty list matches everything.
    #[must_use]
    pub fn matches_types(&self, types: &[String]) -> bool {
        if types.is_empty() {
            return true;
        }
        self.resource_type
            .as_deref()
            .is_some_and(|t| types.iter().any(|wanted| wanted == t))
    }
}

/// `GET /api2/json/version`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub release: Option<String>,
    pub repoid: Option<String>,
}
