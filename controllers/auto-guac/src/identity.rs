//! Network identity (MAC, IP) for a cluster resource.
//!
//! There is no derivation policy yet: the MAC should come from the guest's
//! network device config and the IP from an address plan, and neither is
//! implemented. [`PlaceholderIdentity`] hands every resource the same
//! configured pair and says so in the log, so the gap stays visible.

use proxmox_client::ClusterResource;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use tracing::warn;

/// A 48-bit MAC address, displayed as upper-case colon-separated hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(try_from = "String")]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl FromStr for MacAddress {
    type Err = String;

    /// Accepts `aa:bb:cc:dd:ee:ff`, `aa-bb-cc-dd-ee-ff` and `aabb.ccdd.eeff`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.chars().all(|c| c.is_ascii_hexdigit() || matches!(c, ':' | '-' | '.')) {
            return Err(format!("invalid MAC address {:?}: unexpected character", s));
        }
        let hex: String = s.chars().filter(char::is_ascii_hexdigit).collect();
        if hex.len() != 12 {
            return Err(format!("invalid MAC address {:?}: expected 12 hex digits", s));
        }

        let mut octets = [0u8; 6];
        for (i, octet) in octets.iter_mut().enumerate() {
            *octet = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|e| format!("invalid MAC address {:?}: {}", s, e))?;
        }
        Ok(Self(octets))
    }
}

impl TryFrom<String> for MacAddress {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}", a, b, c, d, e, g)
    }
}

/// What the router and gateway are configured with for one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkIdentity {
    pub mac: MacAddress,
    pub ip: IpAddr,
}

/// Derives a network identity for a resource
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, resource: &ClusterResource) -> NetworkIdentity;
}

/// Returns the same configured (MAC, IP) for every resource.
#[derive(Debug, Clone)]
pub struct PlaceholderIdentity {
    identity: NetworkIdentity,
}

impl PlaceholderIdentity {
    pub fn new(mac: MacAddress, ip: IpAddr) -> Self {
        Self {
            identity: NetworkIdentity { mac, ip },
        }
    }
}

impl IdentityResolver for PlaceholderIdentity {
    fn resolve(&self, resource: &ClusterResource) -> NetworkIdentity {
        // TODO: read the MAC from the guest's net0 config and allocate the IP from an address plan
        warn!(
            "Using placeholder identity {} / {} for {}: MAC/IP derivation is not implemented",
            self.identity.mac,
            self.identity.ip,
            resource.name.as_deref().unwrap_or("<unnamed>")
        );
        self.identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mac_formats() {
        let expected = MacAddress::new([0xAA, 0x00, 0x00, 0x01, 0x01, 0x00]);
        assert_eq!("AA:00:00:01:01:00".parse::<MacAddress>().unwrap(), expected);
        assert_eq!("aa-00-00-01-01-00".parse::<MacAddress>().unwrap(), expected);
        assert_eq!("aa00.0001.0100".parse::<MacAddress>().unwrap(), expected);
    }

    #[test]
    fn test_parse_mac_rejects_garbage() {
        assert!("AA:00:00:01:01".parse::<MacAddress>().is_err());
        assert!("AA:00:00:01:01:00:11".parse::<MacAddress>().is_err());
        assert!("ZZ:00:00:01:01:00".parse::<MacAddress>().is_err());
        assert!("AA 00 00 01 01 00".parse::<MacAddress>().is_err());
        assert!("".parse::<MacAddress>().is_err());
    }

    #[test]
    fn test_mac_display_is_upper_case_colon_form() {
        let mac: MacAddress = "de-ad-be-ef-00-01".parse().unwrap();
        assert_eq!(mac.to_string(), "DE:AD:BE:EF:00:01");
    }

    #[test]
    fn test_placeholder_is_the_same_for_every_resource() {
        let resolver = PlaceholderIdentity::new(
            "AA:00:00:01:01:00".parse().unwrap(),
            "172.16.1.100".parse().unwrap(),
        );

        let first = resolver.resolve(&ClusterResource::named("vm-1"));
        let second = resolver.resolve(&ClusterResource::named("vm-2"));

        assert_eq!(first, second);
        assert_eq!(first.ip.to_string(), "172.16.1.100");
        assert_eq!(first.mac.to_string(), "AA:00:00:01:01:00");
    }
}
