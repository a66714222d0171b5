//! Single-use completion signal for a running job

use std::sync::Arc;

use tracing::{debug, warn};

use super::RunningId;
use crate::render::Renderer;
use crate::scheduler::Scheduler;
use crate::transport::{FetchError, FetchResponse};

/// Reports the outcome of one running job.
///
/// Consumed by exactly one of [`succeed`](Self::succeed) or
/// [`fail`](Self::fail). The scheduler is told first so the slot is
/// released before rendering; the renderer is told second so the container
/// always leaves its waiting state. Dropping an unconsumed ticket reports
/// [`FetchError::Aborted`].
pub struct CompletionTicket {
    id: RunningId,
    scheduler: Scheduler,
    renderer: Arc<dyn Renderer>,
    consumed: bool,
}

impl CompletionTicket {
    pub(crate) fn new(id: RunningId, scheduler: Scheduler, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            id,
            scheduler,
            renderer,
            consumed: false,
        }
    }

    pub fn id(&self) -> RunningId {
        self.id
    }

    /// Signal a successful fetch
    pub async fn succeed(mut self, response: FetchResponse) {
        debug!(id = %self.id, status = response.status, "CompletionTicket::succeed: called");
        self.consumed = true;
        self.scheduler.complete(self.id).await;
        self.renderer.on_success(&response).await;
    }

    /// Signal a failed fetch
    pub async fn fail(mut self, error: FetchError) {
        debug!(id = %self.id, %error, "CompletionTicket::fail: called");
        self.consumed = true;
        self.scheduler.fail(self.id).await;
        self.renderer.on_failure(&error).await;
    }
}

impl Drop for CompletionTicket {
    fn drop(&mut self) {
        if self.consumed {
            return;
        }
        warn!(id = %self.id, "CompletionTicket dropped without an outcome, reporting failure");

        let id = self.id;
        let scheduler = self.scheduler.clone();
        let renderer = Arc::clone(&self.renderer);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    scheduler.fail(id).await;
                    renderer.on_failure(&FetchError::Aborted).await;
                });
            }
            Err(_) => {
                warn!(%id, "CompletionTicket::drop: no runtime, slot outcome lost");
            }
        }
    }
}
