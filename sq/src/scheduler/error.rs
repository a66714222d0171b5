//! Submission errors

use thiserror::Error;

use crate::job::{JobError, JobState};

/// Why a job was refused before entering the scheduler
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Job must be created, not {0}")]
    InvalidState(JobState),

    #[error(transparent)]
    Job(#[from] JobError),
}
