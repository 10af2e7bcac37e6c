//! Proxmox VE REST API Client
//!
//! A small client for the parts of the Proxmox VE API the provisioning loop
//! needs: the cluster resource inventory and a connectivity check.
//!
//! # Example
//!
//! ```no_run
//! use proxmox_client::{ClientOptions, ProxmoxAuth, ProxmoxClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ProxmoxClient::new(
//!     "https://pve.example.net:8006".to_string(),
//!     ProxmoxAuth::Password {
//!         user: "root@pam".to_string(),
//!         password: "secret".to_string(),
//!     },
//!     ClientOptions::default(),
//! )?;
//!
//! for resource in client.cluster_resources().await? {
//!     println!("{:?}", resource.name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod proxmox_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::{ClientOptions, ProxmoxAuth, ProxmoxClient};
pub use error::ProxmoxError;
pub use models::*;
pub use proxmox_trait::ProxmoxClientTrait;
#[cfg(feature = "test-util")]
pub use mock::MockProxmoxClient;
