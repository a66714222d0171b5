//! Scheduler configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What a failed fetch does to its slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Free the slot and promote, same as success
    #[default]
    Release,
    /// Keep the slot occupied by the failed job forever
    Retain,
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Release => write!(f, "release"),
            Self::Retain => write!(f, "retain"),
        }
    }
}

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Max concurrently running jobs
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Slot handling for failed fetches
    #[serde(default, rename = "failure-policy")]
    pub failure_policy: FailurePolicy,

    /// Treat a fetch running longer than this as failed (no limit when unset)
    #[serde(default, rename = "job-timeout-ms")]
    pub job_timeout_ms: Option<u64>,
}

fn default_capacity() -> usize {
    6
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            capacity: 6,
            failure_policy: FailurePolicy::Release,
            job_timeout_ms: None,
        }
    }
}

impl SchedulerConfig {
    /// Config with the given capacity and defaults elsewhere
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    /// Get the job timeout as a Duration
    pub fn job_timeout(&self) -> Option<Duration> {
        self.job_timeout_ms.map(Duration::from_millis)
    }
}
