//! Scheduler implementation

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tracing::{debug, info};

use crate::job::{CompletionTicket, Job, RunningId, StartedJob};
use crate::transport::{FetchError, Transport};

use super::config::SchedulerConfig;
use super::error::SubmitError;
use super::queue::{Admission, AdmissionQueue, Outcome, QueueEntry, QueueState, SchedulerStats};

struct Shared {
    config: SchedulerConfig,
    transport: Arc<dyn Transport>,
    inner: Mutex<AdmissionQueue>,
    idle: Notify,
}

/// Handle to the admission controller.
///
/// Cloning is cheap and every clone drives the same running map and pending
/// stack. All state changes go through one lock; transport calls and
/// renderer callbacks never run while it is held.
#[derive(Clone)]
pub struct Scheduler {
    shared: Arc<Shared>,
}

impl Scheduler {
    /// Create a new scheduler with the given configuration
    ///
    /// A capacity of 0 is raised to 1, and `config()` reports the effective value.
    pub fn new(config: SchedulerConfig, transport: Arc<dyn Transport>) -> Self {
        debug!(?config, "Scheduler::new: called");
        let inner = AdmissionQueue::new(config.capacity);
        let config = SchedulerConfig {
            capacity: inner.capacity(),
            ..config
        };
        Self {
            shared: Arc::new(Shared {
                config,
                transport,
                inner: Mutex::new(inner),
                idle: Notify::new(),
            }),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.shared.config
    }

    /// Submit a job: start it now if a slot is free, otherwise push it pending
    pub async fn submit(&self, job: Job) -> Result<Admission, SubmitError> {
        debug!(container = ?job.container_id(), "Scheduler::submit: called");
        let mut inner = self.shared.inner.lock().await;

        let started = inner.submit(job)?;
        let admission = match &started {
            Some(started) => Admission::Started(started.id()),
            None => Admission::Queued {
                depth: inner.pending_len(),
            },
        };
        drop(inner);

        if let Some(started) = started {
            self.launch(started);
        }
        debug!(?admission, "Scheduler::submit: done");
        Ok(admission)
    }

    /// Success signal for a running job
    pub async fn complete(&self, id: RunningId) {
        debug!(%id, "Scheduler::complete: called");
        self.release(id, Outcome::Success).await;
    }

    /// Failure signal for a running job
    pub async fn fail(&self, id: RunningId) {
        debug!(%id, "Scheduler::fail: called");
        self.release(id, Outcome::Failure).await;
    }

    async fn release(&self, id: RunningId, outcome: Outcome) {
        let mut inner = self.shared.inner.lock().await;
        let released = inner.release(id, outcome, self.shared.config.failure_policy);
        let idle = inner.is_idle();
        drop(inner);

        if let Some(job) = &released.finished {
            info!(%id, container = ?job.container_id(), state = %job.state(), "Job finished");
        }
        if let Some(promoted) = released.promoted {
            debug!(id = %promoted.id(), "Scheduler::release: promoting from pending");
            self.launch(promoted);
        }
        if idle {
            debug!("Scheduler::release: idle, notifying waiters");
            self.shared.idle.notify_waiters();
        }
    }

    /// Spawn the fetch for a job that just entered `Running`
    fn launch(&self, started: StartedJob) {
        debug!(id = %started.id(), url = %started.request.url, "Scheduler::launch: called");
        let scheduler = self.clone();
        let transport = Arc::clone(&self.shared.transport);
        let timeout = self.shared.config.job_timeout();
        tokio::spawn(run_job(started, scheduler, transport, timeout));
    }

    /// Get current queue state
    pub async fn queue_state(&self) -> QueueState {
        debug!("Scheduler::queue_state: called");
        self.shared.inner.lock().await.state()
    }

    /// Get per-job queue entries
    pub async fn queue_details(&self) -> Vec<QueueEntry> {
        debug!("Scheduler::queue_details: called");
        self.shared.inner.lock().await.details()
    }

    /// Get the scheduler statistics
    pub async fn stats(&self) -> SchedulerStats {
        debug!("Scheduler::stats: called");
        self.shared.inner.lock().await.stats().clone()
    }

    pub async fn is_idle(&self) -> bool {
        self.shared.inner.lock().await.is_idle()
    }

    /// Wait until nothing is running or pending.
    ///
    /// Never resolves while a retained failure holds a slot.
    pub async fn wait_idle(&self) {
        debug!("Scheduler::wait_idle: called");
        loop {
            let notified = self.shared.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_idle().await {
                debug!("Scheduler::wait_idle: idle");
                return;
            }
            notified.await;
        }
    }
}

/// Perform one job's fetch and report its outcome
async fn run_job(
    started: StartedJob,
    scheduler: Scheduler,
    transport: Arc<dyn Transport>,
    timeout: Option<Duration>,
) {
    let StartedJob { id, request, renderer } = started;
    let ticket = CompletionTicket::new(id, scheduler, renderer);

    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, transport.fetch(&request)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(FetchError::Timeout(limit)),
        },
        None => transport.fetch(&request).await,
    };

    match outcome {
        Ok(response) => ticket.succeed(response).await,
        Err(error) => ticket.fail(error).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use async_trait::async_trait;
    use tokio::sync::oneshot;

    use crate::config::Config;
    use crate::job::JobState;
    use crate::render::NullRenderer;
    use crate::scheduler::FailurePolicy;
    use crate::transport::{FetchRequest, FetchResponse};

    /// Transport whose fetches finish only when the test says so
    #[derive(Default)]
    struct GatedTransport {
        gates: std::sync::Mutex<HashMap<String, oneshot::Receiver<Result<FetchResponse, FetchError>>>>,
        senders: std::sync::Mutex<HashMap<String, oneshot::Sender<Result<FetchResponse, FetchError>>>>,
    }

    impl GatedTransport {
        fn gate(&self, container: &str) {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(container.to_string(), rx);
            self.senders.lock().unwrap().insert(container.to_string(), tx);
        }

        fn open(&self, container: &str, outcome: Result<FetchResponse, FetchError>) {
            let tx = self.senders.lock().unwrap().remove(container).unwrap();
            tx.send(outcome).unwrap();
        }
    }

    #[async_trait]
    impl Transport for GatedTransport {
        async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
            let container = request.get("container_id").unwrap().to_string();
            let rx = self.gates.lock().unwrap().remove(&container);
            match rx {
                Some(rx) => rx.await.unwrap_or(Err(FetchError::Aborted)),
                None => Ok(FetchResponse::new(200, "ok")),
            }
        }
    }

    fn job(name: &str) -> Job {
        let mut request = FetchRequest::new("/cgi/stats/get");
        request.set("container_id", Some(name.to_string()));
        request.set("view", Some("Counter".to_string()));
        Job::new(request, Arc::new(NullRenderer))
    }

    async fn settle(scheduler: &Scheduler, running: usize, pending: usize) {
        for _ in 0..200 {
            let state = scheduler.queue_state().await;
            if state.running == running && state.pending == pending {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("scheduler did not settle at running={} pending={}", running, pending);
    }

    #[tokio::test]
    async fn test_submit_reports_admission() {
        let transport = Arc::new(GatedTransport::default());
        for name in ["a", "b", "c", "d"] {
            transport.gate(name);
        }
        let scheduler = Scheduler::new(SchedulerConfig::with_capacity(2), transport.clone());

        assert_eq!(scheduler.submit(job("a")).await.unwrap(), Admission::Started(RunningId(0)));
        assert_eq!(scheduler.submit(job("b")).await.unwrap(), Admission::Started(RunningId(1)));
        assert_eq!(scheduler.submit(job("c")).await.unwrap(), Admission::Queued { depth: 1 });
        assert_eq!(scheduler.submit(job("d")).await.unwrap(), Admission::Queued { depth: 2 });

        transport.open("a", Ok(FetchResponse::new(200, "a")));
        settle(&scheduler, 2, 1).await;

        let details = scheduler.queue_details().await;
        let running: Vec<_> = details.iter().filter(|e| e.running_id.is_some()).collect();
        assert_eq!(running[1].container_id, "d");
        assert_eq!(running[1].running_id, Some(RunningId(2)));
    }

    #[tokio::test]
    async fn test_rejected_submit() {
        let scheduler = Scheduler::new(SchedulerConfig::default(), Arc::new(GatedTransport::default()));
        let bad = Job::new(FetchRequest::new("/cgi/stats/get"), Arc::new(NullRenderer));

        assert_eq!(
            scheduler.submit(bad).await.unwrap_err(),
            SubmitError::MissingField("container_id")
        );
        assert!(scheduler.is_idle().await);
        assert_eq!(scheduler.stats().await.total_rejected, 1);
    }

    #[tokio::test]
    async fn test_wait_idle_after_all_complete() {
        let scheduler = Scheduler::new(SchedulerConfig::with_capacity(2), Arc::new(GatedTransport::default()));
        for i in 0..7 {
            scheduler.submit(job(&format!("j{}", i))).await.unwrap();
        }

        tokio::time::timeout(Duration::from_secs(5), scheduler.wait_idle())
            .await
            .expect("scheduler should drain");

        let stats = scheduler.stats().await;
        assert_eq!(stats.total_completed, 7);
        assert_eq!(stats.peak_running, 2);
    }

    #[tokio::test]
    async fn test_timeout_fails_job_and_frees_slot() {
        let transport = Arc::new(GatedTransport::default());
        transport.gate("slow");
        let config = SchedulerConfig {
            capacity: 1,
            job_timeout_ms: Some(20),
            ..Default::default()
        };
        let scheduler = Scheduler::new(config, transport.clone());

        scheduler.submit(job("slow")).await.unwrap();
        scheduler.submit(job("next")).await.unwrap();

        tokio::time::timeout(Duration::from_secs(5), scheduler.wait_idle())
            .await
            .expect("timeout should release the slot");

        let stats = scheduler.stats().await;
        assert_eq!(stats.total_failed, 1);
        assert_eq!(stats.total_completed, 1);
    }

    #[tokio::test]
    async fn test_retained_failure_keeps_slot() {
        let transport = Arc::new(GatedTransport::default());
        transport.gate("j1");
        let config = SchedulerConfig {
            capacity: 1,
            failure_policy: FailurePolicy::Retain,
            ..Default::default()
        };
        let scheduler = Scheduler::new(config, transport.clone());

        scheduler.submit(job("j1")).await.unwrap();
        transport.open("j1", Err(FetchError::Unauthorized));

        for _ in 0..200 {
            if scheduler.stats().await.total_failed == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert_eq!(scheduler.submit(job("j2")).await.unwrap(), Admission::Queued { depth: 1 });
        settle(&scheduler, 1, 1).await;

        let details = scheduler.queue_details().await;
        assert_eq!(details[0].container_id, "j1");
        assert_eq!(details[0].status, JobState::Running);
        assert!(details[0].retained);

        // A second failure signal for the retained job changes nothing
        scheduler.fail(RunningId(0)).await;
        let stats = scheduler.stats().await;
        assert_eq!(stats.total_failed, 1);
        assert_eq!(stats.stray_releases, 1);
        settle(&scheduler, 1, 1).await;
    }

    #[tokio::test]
    async fn test_zero_capacity_scheduler_still_drains() {
        let scheduler = Scheduler::new(SchedulerConfig::with_capacity(0), Arc::new(GatedTransport::default()));
        assert_eq!(scheduler.config().capacity, 1);

        for i in 0..3 {
            scheduler.submit(job(&format!("j{}", i))).await.unwrap();
        }
        tokio::time::timeout(Duration::from_secs(5), scheduler.wait_idle())
            .await
            .expect("a zero capacity request must not park jobs forever");
        assert_eq!(scheduler.stats().await.total_completed, 3);
    }

    #[tokio::test]
    async fn test_scheduler_from_default_config() {
        let config = Config::default();
        let scheduler = Scheduler::new(config.scheduler.clone(), Arc::new(GatedTransport::default()));
        assert_eq!(scheduler.queue_state().await.capacity, 6);
    }
}
