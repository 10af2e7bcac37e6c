//! Ubiquiti EdgeOS SSH Client
//!
//! Adds DHCP static mappings to an EdgeRouter by running a single
//! `set static-mapping` command over SSH. Each call opens its own session and
//! closes it afterwards.

pub mod client;
pub mod error;
pub mod host_keys;
pub mod models;
#[path = "trait.rs"]
pub mod router_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::{EdgeRouterClient, RouterConnection, SshAuth};
pub use error::EdgeOsError;
pub use host_keys::HostKeyPolicy;
pub use models::*;
pub use router_trait::EdgeRouter;
#[cfg(feature = "test-util")]
pub use mock::MockEdgeRouter;
