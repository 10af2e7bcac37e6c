//! Main controller implementation.
//!
//! The `Controller` owns every collaborator and runs the poll loop: fetch the
//! inventory, provision each resource in turn, log the cycle, wait.

use crate::config::Config;
use crate::error::ControllerError;
use crate::identity::{IdentityResolver, PlaceholderIdentity};
use crate::outcome::CycleReport;
use crate::provision::{Gateway, Provisioner};
use chrono::Utc;
use guacamole_client::GuacamoleClient;
use guacamole_client::wol::MySqlWolStore;
use proxmox_client::{ClusterResource, ProxmoxClient, ProxmoxClientTrait};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use ubiquiti_client::EdgeRouterClient;

/// Poll loop over the Proxmox inventory.
pub struct Controller {
    inventory: Option<Box<dyn ProxmoxClientTrait>>,
    identity: Box<dyn IdentityResolver>,
    provisioner: Provisioner,
    resource_types: Vec<String>,
    interval: Duration,
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("inventory", &self.inventory.as_ref().map(|c| c.base_url()))
            .field("provisioner", &self.provisioner)
            .field("resource_types", &self.resource_types)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl Controller {
    pub fn new(
        inventory: Option<Box<dyn ProxmoxClientTrait>>,
        identity: Box<dyn IdentityResolver>,
        provisioner: Provisioner,
        resource_types: Vec<String>,
        interval: Duration,
    ) -> Self {
        Self {
            inventory,
            identity,
            provisioner,
            resource_types,
            interval,
        }
    }

    /// Builds the real clients for every enabled section.
    pub fn from_config(config: &Config) -> Result<Self, ControllerError> {
        info!("Initializing proxmox-auto-guac controller");

        let inventory: Option<Box<dyn ProxmoxClientTrait>> = if config.proxmox.enabled {
            Some(Box::new(ProxmoxClient::new(
                config.proxmox.api_url.clone(),
                config.proxmox.auth(),
                config.proxmox.client_options(),
            )?))
        } else {
            warn!("Proxmox polling is disabled; no resources will be provisioned");
            None
        };

        let router = config.ubiquiti.enabled.then(|| {
            Box::new(EdgeRouterClient::new(config.ubiquiti.connection()))
                as Box<dyn ubiquiti_client::EdgeRouter>
        });

        let gateway = if config.guacamole.enabled {
            Some(Gateway {
                client: Box::new(GuacamoleClient::new(
                    config.guacamole.api_url.clone(),
                    config.guacamole.user.clone(),
                    config.guacamole.password.expose().to_string(),
                    config.guacamole.client_options(),
                )?),
                wol: Box::new(MySqlWolStore::new(config.guacamole.database())),
            })
        } else {
            None
        };

        let identity = PlaceholderIdentity::new(
            config.identity.placeholder_mac,
            config.identity.placeholder_ip,
        );

        Ok(Self::new(
            inventory,
            Box::new(identity),
            Provisioner::new(router, gateway),
            config.proxmox.resource_types.clone(),
            config.poll.interval(),
        ))
    }

    /// Startup probe; a failure is only a warning since the loop retries every cycle
    pub async fn check_connectivity(&self) {
        let Some(client) = &self.inventory else {
            return;
        };
        match client.version().await {
            Ok(version) => info!(
                "Connected to Proxmox VE {} at {}",
                version.version,
                client.base_url()
            ),
            Err(e) => warn!("Proxmox at {} is not reachable yet: {}", client.base_url(), e),
        }
    }

    /// Errors become an empty inventory plus an error log
    pub async fn fetch_inventory(&self) -> Vec<ClusterResource> {
        let Some(client) = &self.inventory else {
            return Vec::new();
        };

        info!("Checking Proxmox for new VMs...");
        match client.cluster_resources().await {
            Ok(resources) => {
                debug!("Proxmox returned {} resources", resources.len());
                resources
            }
            Err(e) => {
                error!("Proxmox inventory error: {}", e);
                Vec::new()
            }
        }
    }

    /// One pass over the inventory, strictly sequential.
    pub async fn run_cycle(&self) -> CycleReport {
        let started_at = Utc::now();
        let mut resources = Vec::new();
        let mut ignored = 0;

        for resource in self.fetch_inventory().await {
            if !resource.matches_types(&self.resource_types) {
                debug!(
                    "Ignoring {} (type {:?} not selected)",
                    resource.id.as_deref().unwrap_or("<no id>"),
                    resource.resource_type
                );
                ignored += 1;
                continue;
            }
            let Some(name) = resource.name.as_deref() else {
                debug!(
                    "Ignoring unnamed resource {}",
                    resource.id.as_deref().unwrap_or("<no id>")
                );
                ignored += 1;
                continue;
            };

            let identity = self.identity.resolve(&resource);
            resources.push(self.provisioner.provision(name, &identity).await);
        }

        CycleReport {
            started_at,
            finished_at: Utc::now(),
            resources,
            ignored,
        }
    }

    /// Run until Ctrl-C arrives between cycles.
    pub async fn run(&self) {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Cannot listen for Ctrl-C, running until killed: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;
    }

    /// Run cycles until `shutdown` completes. Shutdown is only observed while
    /// waiting between cycles, so a cycle in progress always finishes.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!(
            "Starting provisioning loop (every {}s)",
            self.interval.as_secs()
        );
        tokio::pin!(shutdown);

        loop {
            let report = self.run_cycle().await;
            info!("Cycle finished: {}", report);

            tokio::select! {
                () = tokio::time::sleep(self.interval) => {}
                () = &mut shutdown => {
                    info!("Shutdown requested, stopping provisioning loop");
                    return;
                }
            }
        }
    }
}
