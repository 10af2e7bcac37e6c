//! Apache Guacamole Client
//!
//! Two independent halves:
//! - [`GuacamoleClient`]: creates connection profiles through the REST API
//! - [`wol`]: attaches Wake-on-LAN parameters to a profile directly in the
//!   MySQL database behind Guacamole's JDBC auth extension
//!
//! # Example
//!
//! ```no_run
//! use guacamole_client::{ClientOptions, ConnectionProfile, GuacamoleClient};
//! use guacamole_client::wol::{DatabaseSettings, MySqlWolStore, WolStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GuacamoleClient::new(
//!     "https://guac.example.net/guacamole".to_string(),
//!     "guacadmin".to_string(),
//!     "guacadmin".to_string(),
//!     ClientOptions::default(),
//! )?;
//! client.create_connection(&ConnectionProfile::ssh("vm-42", "172.16.1.100")).await?;
//!
//! let store = MySqlWolStore::new(DatabaseSettings {
//!     host: "db".to_string(),
//!     port: 3306,
//!     user: "guacamole_user".to_string(),
//!     password: "secret".to_string(),
//!     database: "guacamole_db".to_string(),
//!     timeout: std::time::Duration::from_secs(30),
//! });
//! store.attach_wol("vm-42", "AA:00:00:01:01:00").await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod guacamole_trait;
pub mod wol;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::{ClientOptions, GuacamoleClient};
pub use error::GuacamoleError;
pub use guacamole_trait::GuacamoleClientTrait;
pub use models::*;
#[cfg(feature = "test-util")]
pub use mock::{MockGuacamoleClient, MockWolStore};
