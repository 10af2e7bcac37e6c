//! Provisioning steps for one resource
//!
//! Router first, then gateway; the gateway step chains into WOL only when the
//! connection profile was created. Every collaborator error ends here: it is
//! logged and becomes a [`StepOutcome`], never a propagated error.

use crate::identity::NetworkIdentity;
use crate::outcome::{ResourceReport, StepOutcome};
use guacamole_client::wol::WolStore;
use guacamole_client::{ConnectionProfile, GuacamoleClientTrait, WolOutcome};
use std::fmt;
use tracing::{error, info};
use ubiquiti_client::{EdgeRouter, StaticMapping};

/// Guacamole REST client plus the database its WOL parameters live in
pub struct Gateway {
    pub client: Box<dyn GuacamoleClientTrait>,
    pub wol: Box<dyn WolStore>,
}

/// Runs the router, gateway and WOL steps. A `None` collaborator means the
/// section is disabled in the configuration.
pub struct Provisioner {
    router: Option<Box<dyn EdgeRouter>>,
    gateway: Option<Gateway>,
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("base_url", &self.client.base_url())
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for Provisioner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provisioner")
            .field("router", &self.router.as_ref().map(|r| r.host()))
            .field("gateway", &self.gateway)
            .finish()
    }
}

impl Provisioner {
    pub fn new(router: Option<Box<dyn EdgeRouter>>, gateway: Option<Gateway>) -> Self {
        Self { router, gateway }
    }

    pub async fn provision(&self, name: &str, identity: &NetworkIdentity) -> ResourceReport {
        let router = self.configure_router(name, identity).await;
        let (gateway, wol) = self.configure_gateway(name, identity).await;

        ResourceReport {
            name: name.to_string(),
            identity: *identity,
            router,
            gateway,
            wol,
        }
    }

    pub async fn configure_router(&self, hostname: &str, identity: &NetworkIdentity) -> StepOutcome {
        let Some(router) = &self.router else {
            info!("Skipping Ubiquiti configuration (disabled in config).");
            return StepOutcome::Skipped("router disabled".to_string());
        };

        let mapping = StaticMapping::new(hostname, identity.ip, identity.mac.to_string());
        info!("Configuring Ubiquiti for {}", mapping);

        match router.set_static_mapping(&mapping).await {
            Ok(()) => {
                info!("Ubiquiti DHCP reservation added: {} -> {}", hostname, identity.ip);
                StepOutcome::Applied
            }
            Err(e) => {
                error!("Ubiquiti SSH error on {}: {}", router.host(), e);
                StepOutcome::Failed(e.to_string())
            }
        }
    }

    /// Returns the (gateway, wol) outcomes
    pub async fn configure_gateway(
        &self,
        name: &str,
        identity: &NetworkIdentity,
    ) -> (StepOutcome, StepOutcome) {
        let Some(gateway) = &self.gateway else {
            info!("Skipping Guacamole configuration (disabled in config).");
            return (
                StepOutcome::Skipped("gateway disabled".to_string()),
                StepOutcome::Skipped("gateway disabled".to_string()),
            );
        };

        info!("Adding Guacamole connection for {} ({})", name, identity.ip);
        let profile = ConnectionProfile::ssh(name, identity.ip.to_string());

        match gateway.client.create_connection(&profile).await {
            Ok(()) => {
                info!("Guacamole connection added: {} -> {}", name, identity.ip);
                let wol = configure_wol(gateway.wol.as_ref(), name, identity).await;
                (StepOutcome::Applied, wol)
            }
            Err(e) => {
                error!("Guacamole API error for {}: {}", name, e);
                (
                    StepOutcome::Failed(e.to_string()),
                    StepOutcome::Skipped("connection profile not created".to_string()),
                )
            }
        }
    }
}

pub async fn configure_wol(store: &dyn WolStore, name: &str, identity: &NetworkIdentity) -> StepOutcome {
    let mac = identity.mac.to_string();
    info!("Configuring WOL for {} ({})", name, mac);

    match store.attach_wol(name, &mac).await {
        Ok(WolOutcome::Attached { connection_id }) => {
            info!("WOL configured for {} (connection {})", name, connection_id);
            StepOutcome::Applied
        }
        Ok(WolOutcome::ConnectionMissing) => {
            info!("No Guacamole connection named {}; WOL not configured", name);
            StepOutcome::Skipped("connection not found in database".to_string())
        }
        Err(e) => {
            error!("MySQL WOL configuration error for {}: {}", name, e);
            StepOutcome::Failed(e.to_string())
        }
    }
}
