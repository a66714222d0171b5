//! Scheduler for widget fetch jobs
//!
//! Bounds how many fetches run at once. Jobs beyond capacity wait on a
//! pending stack; whenever a slot frees, the most recently pushed pending
//! job is promoted (last in, first out).

mod config;
mod core;
mod error;
mod queue;

pub use config::{FailurePolicy, SchedulerConfig};
pub use core::Scheduler;
pub use error::SubmitError;
pub use queue::{Admission, AdmissionQueue, Outcome, QueueEntry, QueueState, Released, SchedulerStats};
