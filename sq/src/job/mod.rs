//! Jobs: one widget's admission-controlled fetch
//!
//! A [`Job`] owns its fetch request and its renderer. Only the scheduler
//! moves it between states; the job itself never decides admission.

use std::sync::Arc;

use tracing::debug;

use crate::render::Renderer;
use crate::scheduler::SubmitError;
use crate::transport::FetchRequest;

mod state;
mod ticket;

pub use state::{JobError, JobState, RunningId};
pub use ticket::CompletionTicket;

/// One unit of fetch-and-render work
pub struct Job {
    request: FetchRequest,
    renderer: Arc<dyn Renderer>,
    state: JobState,
    running_id: Option<RunningId>,
}

/// Snapshot handed to the runtime when a job enters `Running`
pub struct StartedJob {
    pub(crate) id: RunningId,
    pub(crate) request: FetchRequest,
    pub(crate) renderer: Arc<dyn Renderer>,
}

impl StartedJob {
    pub fn id(&self) -> RunningId {
        self.id
    }
}

impl Job {
    pub fn new(request: FetchRequest, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            request,
            renderer,
            state: JobState::Created,
            running_id: None,
        }
    }

    pub fn request(&self) -> &FetchRequest {
        &self.request
    }

    pub fn renderer(&self) -> &Arc<dyn Renderer> {
        &self.renderer
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Set only while the job is `Running`
    pub fn running_id(&self) -> Option<RunningId> {
        self.running_id
    }

    pub fn container_id(&self) -> Option<&str> {
        self.request.get("container_id")
    }

    pub fn view(&self) -> Option<&str> {
        self.request.get("view")
    }

    /// Check the job can be submitted; never mutates
    pub fn validate(&self) -> Result<(), SubmitError> {
        if self.state != JobState::Created {
            return Err(SubmitError::InvalidState(self.state));
        }
        if self.container_id().is_none() {
            return Err(SubmitError::MissingField("container_id"));
        }
        if self.view().is_none() {
            return Err(SubmitError::MissingField("view"));
        }
        Ok(())
    }

    fn transition(&mut self, next: JobState) -> Result<(), JobError> {
        if !self.state.can_transition_to(next) {
            return Err(JobError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        debug!(from = %self.state, to = %next, container = ?self.container_id(), "Job::transition");
        self.state = next;
        Ok(())
    }

    /// Park the job on the pending stack
    pub(crate) fn defer(&mut self) -> Result<(), JobError> {
        self.transition(JobState::Pending)
    }

    /// Enter `Running` with the given id
    pub(crate) fn start(&mut self, id: RunningId) -> Result<StartedJob, JobError> {
        self.transition(JobState::Running)?;
        self.running_id = Some(id);
        Ok(StartedJob {
            id,
            request: self.request.clone(),
            renderer: Arc::clone(&self.renderer),
        })
    }

    pub(crate) fn complete(&mut self) -> Result<(), JobError> {
        self.transition(JobState::Completed)?;
        self.running_id = None;
        Ok(())
    }

    pub(crate) fn fail(&mut self) -> Result<(), JobError> {
        self.transition(JobState::Failed)?;
        self.running_id = None;
        Ok(())
    }
}

impl std::fmt::Debug for StartedJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StartedJob")
            .field("id", &self.id)
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("request", &self.request)
            .field("state", &self.state)
            .field("running_id", &self.running_id)
            .finish_non_exhaustive()
    }
}
