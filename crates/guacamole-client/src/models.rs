//! Guacamole models
//!
//! Parameter names follow the JDBC schema's `guacamole_connection_parameter`
//! table, which stores one row per (connection, parameter).

use serde::{Deserialize, Serialize};

/// Protocol every generated profile uses
pub const DEFAULT_PROTOCOL: &str = "ssh";

/// Parameter holding the MAC address the magic packet is sent to
pub const WOL_MAC_PARAMETER: &str = "wol-mac-addr";
/// Parameter telling Guacamole to send the packet before connecting
pub const WOL_SEND_PARAMETER: &str = "wol-send-packet";

/// A remote-desktop connection profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionProfile {
    /// Profile name, taken from the VM name
    pub name: String,
    /// Host Guacamole connects to
    pub hostname: String,
    pub protocol: String,
}

impl ConnectionProfile {
    /// Profile for an SSH connection to `hostname`
    pub fn ssh(name: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hostname: hostname.into(),
            protocol: DEFAULT_PROTOCOL.to_string(),
        }
    }

    /// Request body sent to the API; the name travels in the URL path
    #[must_use]
    pub fn request_body(&self) -> ConnectionRequest<'_> {
        ConnectionRequest {
            hostname: &self.hostname,
            protocol: &self.protocol,
        }
    }
}

/// JSON body for `POST /api/session/data/{name}`
#[derive(Debug, Serialize)]
pub struct ConnectionRequest<'a> {
    pub hostname: &'a str,
    pub protocol: &'a str,
}

/// One row of `guacamole_connection_parameter`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParameter {
    pub connection_id: i32,
    pub name: String,
    pub value: String,
}

/// The two rows enabling Wake-on-LAN for `connection_id`
#[must_use]
pub fn wol_parameters(connection_id: i32, mac: &str) -> [ConnectionParameter; 2] {
    [
        ConnectionParameter {
            connection_id,
            name: WOL_MAC_PARAMETER.to_string(),
            value: mac.to_string(),
        },
        ConnectionParameter {
            connection_id,
            name: WOL_SEND_PARAMETER.to_string(),
            value: "true".to_string(),
        },
    ]
}

/// What attaching WOL parameters did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WolOutcome {
    /// Rows written and committed
    Attached { connection_id: i32 },
    /// No connection with that name; nothing written
    ConnectionMissing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_is_hostname_and_protocol_only() {
        let profile = ConnectionProfile::ssh("vm-42", "172.16.1.100");
        let body = serde_json::to_value(profile.request_body()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"hostname": "172.16.1.100", "protocol": "ssh"})
        );
    }

    #[test]
    fn test_wol_parameters() {
        let [mac, send] = wol_parameters(17, "AA:00:00:01:01:00");
        assert_eq!(
            mac,
            ConnectionParameter {
                connection_id: 17,
                name: "wol-mac-addr".to_string(),
                value: "AA:00:00:01:01:00".to_string(),
            }
        );
        assert_eq!(
            send,
            ConnectionParameter {
                connection_id: 17,
                name: "wol-send-packet".to_string(),
                value: "true".to_string(),
            }
        );
    }
}
