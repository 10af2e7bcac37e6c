//! Mock Guacamole client and WOL store for unit testing
//!
//! Both record every call so tests can assert on what the provisioning loop
//! sent, and both can be switched into a failing mode.

use crate::error::GuacamoleError;
use crate::guacamole_trait::GuacamoleClientTrait;
use crate::models::{ConnectionProfile, WolOutcome};
use crate::wol::WolStore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Mock GuacamoleClient for testing
#[derive(Debug, Clone)]
pub struct MockGuacamoleClient {
    base_url: String,
    profiles: Arc<Mutex<Vec<ConnectionProfile>>>,
    // Status code to answer with instead of 200
    failure: Arc<Mutex<Option<u16>>>,
}

impl MockGuacamoleClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            profiles: Arc::new(Mutex::new(Vec::new())),
            failure: Arc::new(Mutex::new(None)),
        }
    }

    /// Answer every request with `status` instead of 200
    pub fn fail_with_status(&self, status: u16) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(status);
    }

    /// Profiles that were POSTed, in order (including failed ones)
    pub fn profiles(&self) -> Vec<ConnectionProfile> {
        self.profiles.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait::async_trait]
impl GuacamoleClientTrait for MockGuacamoleClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn create_connection(&self, profile: &ConnectionProfile) -> Result<(), GuacamoleError> {
        self.profiles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(profile.clone());

        match *self.failure.lock().unwrap_or_else(PoisonError::into_inner) {
            Some(status) => Err(GuacamoleError::Api {
                status,
                body: "mock failure".to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// Mock WolStore: an in-memory `guacamole_connection` name -> id table
#[derive(Debug, Clone, Default)]
pub struct MockWolStore {
    connections: Arc<Mutex<HashMap<String, i32>>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
    failing: Arc<Mutex<bool>>,
}

impl MockWolStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend a connection named `name` exists with id `connection_id`
    pub fn add_connection(&self, name: impl Into<String>, connection_id: i32) {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), connection_id);
    }

    /// Make every call fail with a database-style error
    pub fn fail(&self) {
        *self.failing.lock().unwrap_or_else(PoisonError::into_inner) = true;
    }

    /// (connection name, mac) of every call, in order
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait::async_trait]
impl WolStore for MockWolStore {
    async fn attach_wol(&self, connection_name: &str, mac: &str) -> Result<WolOutcome, GuacamoleError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((connection_name.to_string(), mac.to_string()));

        if *self.failing.lock().unwrap_or_else(PoisonError::into_inner) {
            return Err(GuacamoleError::Database(sqlx::Error::PoolTimedOut));
        }

        let connection_id = self
            .connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(connection_name)
            .copied();
        Ok(match connection_id {
            Some(connection_id) => WolOutcome::Attached { connection_id },
            None => WolOutcome::ConnectionMissing,
        })
    }
}
