//! statsq - bounded-concurrency fetching for stats widgets
//!
//! A page of stats widgets (counters, tables, charts) each needs one fetch
//! before it can render. statsq admits at most `capacity` of those fetches
//! at a time and parks the rest on a pending stack, promoting the most
//! recently parked job whenever a slot frees.
//!
//! # Modules
//!
//! - [`scheduler`] - Admission control, pending stack and promotion
//! - [`job`] - Job state machine and completion tickets
//! - [`transport`] - Transport trait and HTTP implementation
//! - [`render`] - Renderer trait, widget kinds and the container board
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod job;
pub mod render;
pub mod scheduler;
pub mod transport;

// Re-export commonly used types
pub use config::{Config, TransportConfig};
pub use job::{CompletionTicket, Job, JobError, JobState, RunningId};
pub use render::{Board, BoardRenderer, ContainerState, Renderer, Widget, WidgetConfig, WidgetKind};
pub use scheduler::{Admission, FailurePolicy, QueueEntry, QueueState, Scheduler, SchedulerConfig, SubmitError};
pub use transport::{FetchError, FetchRequest, FetchResponse, HttpTransport, Transport};
