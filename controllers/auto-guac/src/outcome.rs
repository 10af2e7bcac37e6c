//! Typed results of provisioning steps and cycles.

use crate::identity::NetworkIdentity;
use chrono::{DateTime, Utc};
use std::fmt;

/// Result of one provisioning step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The remote system accepted the change
    Applied,
    /// The step did not run (disabled, or a precondition was not met)
    Skipped(String),
    /// The step ran and failed; the reason is the error message
    Failed(String),
}

impl StepOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied => f.write_str("applied"),
            Self::Skipped(reason) => write!(f, "skipped ({})", reason),
            Self::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

/// Everything that happened to one resource in a cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceReport {
    pub name: String,
    pub identity: NetworkIdentity,
    pub router: StepOutcome,
    pub gateway: StepOutcome,
    pub wol: StepOutcome,
}

impl ResourceReport {
    fn steps(&self) -> [&StepOutcome; 3] {
        [&self.router, &self.gateway, &self.wol]
    }
}

/// Step counts across a cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub applied: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Summary of one poll cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub resources: Vec<ResourceReport>,
    /// Inventory entries not provisioned (unnamed or filtered by type)
    pub ignored: usize,
}

impl CycleReport {
    #[must_use]
    pub fn tally(&self) -> Tally {
        let mut tally = Tally::default();
        for step in self.resources.iter().flat_map(ResourceReport::steps) {
            match step {
                StepOutcome::Applied => tally.applied += 1,
                StepOutcome::Skipped(_) => tally.skipped += 1,
                StepOutcome::Failed(_) => tally.failed += 1,
            }
        }
        tally
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tally = self.tally();
        let elapsed = self.finished_at - self.started_at;
        write!(
            f,
            "{} resources ({} ignored) in {}ms: {} steps applied, {} skipped, {} failed",
            self.resources.len(),
            self.ignored,
            elapsed.num_milliseconds(),
            tally.applied,
            tally.skipped,
            tally.failed
        )
    }
}
