//! Admission state for the scheduler
//!
//! [`AdmissionQueue`] is the synchronous heart of the scheduler: the running
//! map, the pending stack and the id counter. It never spawns anything; it
//! hands back [`StartedJob`]s for the caller to launch.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, warn};

use crate::job::{Job, JobError, JobState, RunningId, StartedJob};

use super::config::FailurePolicy;
use super::error::SubmitError;

/// Result of a successful submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Admitted immediately with this id
    Started(RunningId),

    /// Pushed onto the pending stack, which now holds `depth` jobs
    Queued { depth: usize },
}

/// How a running job ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

/// Effect of a release on the queue
#[derive(Debug)]
pub struct Released {
    /// The job that left `running`, now terminal
    pub finished: Option<Job>,

    /// Pending job admitted into the freed slot
    pub promoted: Option<StartedJob>,
}

/// Statistics for the scheduler
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SchedulerStats {
    pub total_submitted: u64,
    pub total_started: u64,
    pub total_promoted: u64,
    pub total_completed: u64,
    pub total_failed: u64,
    pub total_rejected: u64,
    /// Releases for ids that were not running, or repeat failures of a
    /// retained job
    pub stray_releases: u64,
    pub peak_running: usize,
    pub peak_pending: usize,
}

/// Queue state for display
#[derive(Debug, Clone, Serialize)]
pub struct QueueState {
    pub capacity: usize,
    pub running: usize,
    pub pending: usize,
    pub stats: SchedulerStats,
}

/// Queue entry for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueEntry {
    pub running_id: Option<RunningId>,
    pub container_id: String,
    pub view: String,
    /// A retained failure keeps reporting `Running`: it still holds its slot
    pub status: JobState,
    /// Failed under `FailurePolicy::Retain` and never released
    pub retained: bool,
}

/// Running map, pending stack and id counter
pub struct AdmissionQueue {
    capacity: usize,
    running: HashMap<RunningId, Job>,
    /// Running ids whose failure was retained
    retained: HashSet<RunningId>,
    /// Used as a stack: the last pushed job is promoted first
    pending: Vec<Job>,
    next_id: u64,
    stats: SchedulerStats,
}

impl AdmissionQueue {
    /// Create an empty queue; a capacity of 0 is raised to 1
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "AdmissionQueue::new: called");
        let capacity = if capacity == 0 {
            warn!("AdmissionQueue::new: capacity 0 would never admit a job, using 1");
            1
        } else {
            capacity
        };
        Self {
            capacity,
            running: HashMap::new(),
            retained: HashSet::new(),
            pending: Vec::new(),
            next_id: 0,
            stats: SchedulerStats::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn running_len(&self) -> usize {
        self.running.len()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_idle(&self) -> bool {
        self.running.is_empty() && self.pending.is_empty()
    }

    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    pub fn running_job(&self, id: RunningId) -> Option<&Job> {
        self.running.get(&id)
    }

    pub fn is_retained(&self, id: RunningId) -> bool {
        self.retained.contains(&id)
    }

    /// Running ids, ascending
    pub fn running_ids(&self) -> Vec<RunningId> {
        let mut ids: Vec<_> = self.running.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Pending jobs from bottom (oldest) to top (next to promote)
    pub fn pending_jobs(&self) -> impl Iterator<Item = &Job> {
        self.pending.iter()
    }

    /// Admit or queue a job
    ///
    /// Returns the started job when a slot was free, `None` when queued.
    /// A rejected job leaves the queue untouched.
    pub fn submit(&mut self, mut job: Job) -> Result<Option<StartedJob>, SubmitError> {
        debug!(container = ?job.container_id(), "AdmissionQueue::submit: called");
        if let Err(e) = job.validate() {
            debug!(error = %e, "AdmissionQueue::submit: rejected");
            self.stats.total_rejected += 1;
            return Err(e);
        }
        self.stats.total_submitted += 1;

        if self.running.len() < self.capacity {
            debug!("AdmissionQueue::submit: under capacity, starting immediately");
            return Ok(Some(self.admit(job)?));
        }

        debug!(pending = self.pending.len(), "AdmissionQueue::submit: at capacity, pushing pending");
        job.defer().map_err(|_| SubmitError::InvalidState(job.state()))?;
        self.pending.push(job);
        self.stats.peak_pending = self.stats.peak_pending.max(self.pending.len());
        Ok(None)
    }

    /// Release a running job's slot and promote the most recent pending job
    pub fn release(&mut self, id: RunningId, outcome: Outcome, policy: FailurePolicy) -> Released {
        debug!(%id, ?outcome, %policy, "AdmissionQueue::release: called");

        if outcome == Outcome::Failure && policy == FailurePolicy::Retain {
            if self.retained.contains(&id) {
                warn!(%id, "AdmissionQueue::release: repeat failure for a retained job");
                self.stats.stray_releases += 1;
            } else if self.running.contains_key(&id) {
                debug!(%id, "AdmissionQueue::release: failure retained, slot stays occupied");
                self.retained.insert(id);
                self.stats.total_failed += 1;
            } else {
                warn!(%id, "AdmissionQueue::release: failure for a job that is not running");
                self.stats.stray_releases += 1;
            }
            return Released {
                finished: None,
                promoted: None,
            };
        }

        let finished = match self.running.remove(&id) {
            Some(mut job) => {
                self.retained.remove(&id);
                let marked = match outcome {
                    Outcome::Success => {
                        self.stats.total_completed += 1;
                        job.complete()
                    }
                    Outcome::Failure => {
                        self.stats.total_failed += 1;
                        job.fail()
                    }
                };
                if let Err(e) = marked {
                    warn!(%id, error = %e, "AdmissionQueue::release: job was not running");
                }
                Some(job)
            }
            None => {
                warn!(%id, "AdmissionQueue::release: id not running, ignoring");
                self.stats.stray_releases += 1;
                None
            }
        };

        Released {
            finished,
            promoted: self.promote(),
        }
    }

    /// Pop the top of the pending stack into a free slot
    fn promote(&mut self) -> Option<StartedJob> {
        if self.running.len() >= self.capacity {
            debug!("AdmissionQueue::promote: no free slot");
            return None;
        }
        let job = self.pending.pop()?;
        match self.admit(job) {
            Ok(started) => {
                self.stats.total_promoted += 1;
                Some(started)
            }
            Err(e) => {
                warn!(error = %e, "AdmissionQueue::promote: pending job could not start, dropping it");
                None
            }
        }
    }

    /// Move a job into `running` under a fresh id
    ///
    /// The id counter only advances once the job has accepted the id.
    fn admit(&mut self, mut job: Job) -> Result<StartedJob, JobError> {
        let id = RunningId(self.next_id);
        let started = job.start(id)?;
        self.next_id += 1;
        debug!(%id, container = ?job.container_id(), "AdmissionQueue::admit: running");

        self.running.insert(id, job);
        self.stats.total_started += 1;
        self.stats.peak_running = self.stats.peak_running.max(self.running.len());
        Ok(started)
    }

    pub fn state(&self) -> QueueState {
        QueueState {
            capacity: self.capacity,
            running: self.running.len(),
            pending: self.pending.len(),
            stats: self.stats.clone(),
        }
    }

    /// Running jobs by id, then pending jobs from next-to-promote down
    pub fn details(&self) -> Vec<QueueEntry> {
        let entry = |job: &Job| QueueEntry {
            running_id: job.running_id(),
            container_id: job.container_id().unwrap_or_default().to_string(),
            view: job.view().unwrap_or_default().to_string(),
            status: job.state(),
            retained: job.running_id().is_some_and(|id| self.retained.contains(&id)),
        };

        self.running_ids()
            .into_iter()
            .filter_map(|id| self.running.get(&id))
            .map(entry)
            .chain(self.pending.iter().rev().map(entry))
            .collect()
    }
}
