//! Server host key verification
//!
//! The decision table lives in [`decide`] so it can be tested without a
//! live SSH server; [`HostKeyVerifier`] wires it into russh's client handler
//! and the OpenSSH `known_hosts` file.

use crate::error::EdgeOsError;
use russh_keys::key::PublicKey;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

/// How to treat the router's host key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostKeyPolicy {
    /// The key must already be present in `known_hosts`
    #[default]
    Strict,
    /// Trust on first use: record unknown keys, reject changed ones
    AcceptNew,
    /// Accept any key without looking at `known_hosts`
    Insecure,
}

/// Result of looking the presented key up in `known_hosts`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownHostLookup {
    Match,
    Unknown,
    /// A different key is recorded for this host at `line`
    Changed { line: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostKeyDecision {
    Accept,
    /// Accept and append the key to `known_hosts`
    AcceptAndLearn,
    Reject(String),
}

/// Apply `policy` to a `known_hosts` lookup result.
///
/// `lookup` is `None` when no lookup was made (insecure policy).
#[must_use]
pub fn decide(policy: HostKeyPolicy, lookup: Option<KnownHostLookup>) -> HostKeyDecision {
    match (policy, lookup) {
        (HostKeyPolicy::Insecure, _) => HostKeyDecision::Accept,
        (_, Some(KnownHostLookup::Match)) => HostKeyDecision::Accept,
        (_, Some(KnownHostLookup::Changed { line })) => HostKeyDecision::Reject(format!(
            "host key differs from the one recorded at known_hosts line {}",
            line
        )),
        (HostKeyPolicy::AcceptNew, Some(KnownHostLookup::Unknown)) => {
            HostKeyDecision::AcceptAndLearn
        }
        (HostKeyPolicy::Strict, Some(KnownHostLookup::Unknown)) => {
            HostKeyDecision::Reject("host key is not in known_hosts".to_string())
        }
        (_, None) => HostKeyDecision::Reject("host key was not checked".to_string()),
    }
}

/// russh client handler enforcing a [`HostKeyPolicy`]
#[derive(Debug)]
pub struct HostKeyVerifier {
    host: String,
    port: u16,
    policy: HostKeyPolicy,
    // Defaults to ~/.ssh/known_hosts
    known_hosts: Option<PathBuf>,
}

impl HostKeyVerifier {
    pub fn new(host: String, port: u16, policy: HostKeyPolicy, known_hosts: Option<PathBuf>) -> Self {
        Self {
            host,
            port,
            policy,
            known_hosts,
        }
    }

    fn lookup(&self, key: &PublicKey) -> Result<KnownHostLookup, EdgeOsError> {
        let result = match &self.known_hosts {
            Some(path) => russh_keys::check_known_hosts_path(&self.host, self.port, key, path),
            None => russh_keys::check_known_hosts(&self.host, self.port, key),
        };
        match result {
            Ok(true) => Ok(KnownHostLookup::Match),
            Ok(false) => Ok(KnownHostLookup::Unknown),
            Err(russh_keys::Error::KeyChanged { line }) => Ok(KnownHostLookup::Changed { line }),
            Err(e) => Err(e.into()),
        }
    }

    fn learn(&self, key: &PublicKey) -> Result<(), EdgeOsError> {
        match &self.known_hosts {
            Some(path) => russh_keys::learn_known_hosts_path(&self.host, self.port, key, path)?,
            None => russh_keys::learn_known_hosts(&self.host, self.port, key)?,
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl russh::client::Handler for HostKeyVerifier {
    type Error = EdgeOsError;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        let lookup = match self.policy {
            HostKeyPolicy::Insecure => None,
            _ => Some(self.lookup(server_public_key)?),
        };

        match decide(self.policy, lookup) {
            HostKeyDecision::Accept => {
                if self.policy == HostKeyPolicy::Insecure {
                    warn!(
                        "Accepting unverified host key {} for {}:{}",
                        server_public_key.fingerprint(),
                        self.host,
                        self.port
                    );
                }
                Ok(true)
            }
            HostKeyDecision::AcceptAndLearn => {
                info!(
                    "Learning new host key {} for {}:{}",
                    server_public_key.fingerprint(),
                    self.host,
                    self.port
                );
                self.learn(server_public_key)?;
                Ok(true)
            }
            HostKeyDecision::Reject(reason) => Err(EdgeOsError::HostKeyRejected {
                host: self.host.clone(),
                port: self.port,
                reason,
            }),
        }
    }
}
