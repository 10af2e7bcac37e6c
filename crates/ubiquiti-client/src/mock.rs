//! Mock EdgeRouter for unit testing
//!
//! Records every mapping (and the command it would have run) instead of
//! opening an SSH session.

use crate::error::EdgeOsError;
use crate::models::StaticMapping;
use crate::router_trait::EdgeRouter;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone)]
pub struct MockEdgeRouter {
    host: String,
    mappings: Arc<Mutex<Vec<StaticMapping>>>,
    commands: Arc<Mutex<Vec<String>>>,
    // Exit status to fail with
    failure: Arc<Mutex<Option<u32>>>,
}

impl MockEdgeRouter {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            mappings: Arc::new(Mutex::new(Vec::new())),
            commands: Arc::new(Mutex::new(Vec::new())),
            failure: Arc::new(Mutex::new(None)),
        }
    }

    /// Make every call fail as if the command exited with `status`
    pub fn fail_with_exit_status(&self, status: u32) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(status);
    }

    /// Mappings that were requested, in order
    pub fn mappings(&self) -> Vec<StaticMapping> {
        self.mappings.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Commands that would have been sent, in order
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait::async_trait]
impl EdgeRouter for MockEdgeRouter {
    fn host(&self) -> &str {
        &self.host
    }

    async fn set_static_mapping(&self, mapping: &StaticMapping) -> Result<(), EdgeOsError> {
        mapping.validate()?;
        self.mappings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(mapping.clone());
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(mapping.command());

        match *self.failure.lock().unwrap_or_else(PoisonError::into_inner) {
            Some(status) => Err(EdgeOsError::CommandFailed {
                status,
                stderr: "mock failure".to_string(),
            }),
            None => Ok(()),
        }
    }
}
