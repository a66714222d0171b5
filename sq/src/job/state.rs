//! Job lifecycle state

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier assigned to a job while it holds a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunningId(pub u64);

impl std::fmt::Display for RunningId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Built, not yet submitted
    #[default]
    Created,
    /// Waiting on the pending stack
    Pending,
    /// Holding a slot, fetch in flight
    Running,
    /// Fetch succeeded
    Completed,
    /// Fetch failed
    Failed,
}

impl JobState {
    /// Whether the job can move from this state to `next`
    pub fn can_transition_to(self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (Created, Pending) | (Created, Running) | (Pending, Running) | (Running, Completed) | (Running, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Errors raised by illegal job transitions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("Invalid job transition: {from} -> {to}")]
    InvalidTransition { from: JobState, to: JobState },
}
