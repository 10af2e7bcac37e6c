//! EdgeOS command models

use crate::error::EdgeOsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// A DHCP reservation: `hostname` always gets `ip` when it asks with `mac`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticMapping {
    pub hostname: String,
    pub ip: IpAddr,
    pub mac: String,
}

impl StaticMapping {
    pub fn new(hostname: impl Into<String>, ip: IpAddr, mac: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ip,
            mac: mac.into(),
        }
    }

    /// Reject values that would change the meaning of the command line.
    ///
    /// The command is sent to a shell, so hostnames are limited to DNS label
    /// characters and the MAC to hex digits and separators.
    pub fn validate(&self) -> Result<(), EdgeOsError> {
        let hostname_ok = !self.hostname.is_empty()
            && self
                .hostname
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_');
        if !hostname_ok {
            return Err(EdgeOsError::InvalidMapping(format!(
                "hostname {:?} contains characters outside [A-Za-z0-9._-]",
                self.hostname
            )));
        }

        let mac_ok = !self.mac.is_empty()
            && self
                .mac
                .chars()
                .all(|c| c.is_ascii_hexdigit() || c == ':' || c == '-');
        if !mac_ok {
            return Err(EdgeOsError::InvalidMapping(format!(
                "MAC address {:?} is not hex with ':' or '-' separators",
                self.mac
            )));
        }

        Ok(())
    }

    /// The router command that installs this mapping
    #[must_use]
    pub fn command(&self) -> String {
        format!(
            "set static-mapping {} ip-address {} mac-address {}",
            self.hostname, self.ip, self.mac
        )
    }
}

impl fmt::Display for StaticMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} -> {})", self.hostname, self.mac, self.ip)
    }
}

/// What a remote command produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the server closed the channel without reporting one
    pub exit_status: Option<u32>,
}
