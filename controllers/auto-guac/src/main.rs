//! proxmox-auto-guac
//!
//! Polls a Proxmox VE cluster for VMs and containers and, for each one:
//! - adds a DHCP static mapping on an EdgeOS router (SSH)
//! - creates a Guacamole connection profile (REST)
//! - attaches Wake-on-LAN parameters to that profile (Guacamole MySQL)
//!
//! Configuration is one YAML file, `/etc/proxmox-auto-guac/config.yaml`
//! unless `AUTO_GUAC_CONFIG` points elsewhere.

mod config;
mod controller;
mod error;
mod identity;
mod logging;
mod outcome;
mod provision;

#[cfg(test)]
mod controller_test;
#[cfg(test)]
mod test_utils;

use crate::config::Config;
use crate::controller::Controller;
use crate::error::ControllerError;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    let env = |key: &str| std::env::var(key).ok();
    let path = config::config_path(env);
    let config = Config::load(&path, env)?;

    logging::init(&config.logging)?;

    info!("Starting proxmox-auto-guac");
    info!("Configuration ({}):", path.display());
    info!("  Proxmox: {}", section(config.proxmox.enabled, &config.proxmox.api_url));
    info!("  Ubiquiti: {}", section(config.ubiquiti.enabled, &config.ubiquiti.host));
    info!("  Guacamole: {}", section(config.guacamole.enabled, &config.guacamole.api_url));
    info!("  Poll interval: {}s", config.poll.interval_secs);

    let controller = Controller::from_config(&config)?;
    controller.check_connectivity().await;
    controller.run().await;

    info!("proxmox-auto-guac stopped");
    Ok(())
}

fn section(enabled: bool, endpoint: &str) -> String {
    if enabled {
        endpoint.to_string()
    } else {
        "disabled".to_string()
    }
}
