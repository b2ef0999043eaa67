//! Job lifecycle types.
//!
//! The job state machine:
//!
//! ```text
//!   submit() ──→ Queued ──→ Running ──→ Completed
//!                  │           │
//!                  │           ├──→ Failed(reason)
//!                  │           │
//!                  └───────────┴──→ Cancelled
//! ```
//!
//! Transitions are monotonic and terminal states are permanent. Results
//! are only available once a job is `Completed`.

use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl JobId {
    /// Create a new job ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Status of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Job is waiting in queue.
    Queued,
    /// Job is currently running.
    Running,
    /// Job completed successfully.
    Completed,
    /// Job failed with an error message.
    Failed(String),
    /// Job was cancelled.
    Cancelled,
}

impl JobStatus {
    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed(_) | JobStatus::Cancelled
        )
    }

    /// Check if the job is still pending (queued or running).
    pub fn is_pending(&self) -> bool {
        matches!(self, JobStatus::Queued | JobStatus::Running)
    }

    /// Check if the job completed successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Completed)
    }

    fn rank(&self) -> u8 {
        match self {
            JobStatus::Queued => 0,
            JobStatus::Running => 1,
            _ => 2,
        }
    }

    /// Whether moving from `self` to `next` respects the lifecycle.
    ///
    /// Staying in the same state is allowed; leaving a terminal state is not.
    pub fn can_transition_to(&self, next: &JobStatus) -> bool {
        if self.is_terminal() {
            return self == next;
        }
        next.rank() >= self.rank()
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "Queued"),
            JobStatus::Running => write!(f, "Running"),
            JobStatus::Completed => write!(f, "Completed"),
            JobStatus::Failed(msg) => write!(f, "Failed: {msg}"),
            JobStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// A job with bookkeeping for local tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// The job identifier.
    pub id: JobId,
    /// Current status.
    pub status: JobStatus,
    /// Number of samples requested.
    pub num_samples: u32,
    /// Time the job was created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Time the job started running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// Time the job finished.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Solver the job was submitted to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solver: Option<String>,
}

impl Job {
    /// Create a new job.
    pub fn new(id: impl Into<JobId>, num_samples: u32) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Queued,
            num_samples,
            created_at: Some(Utc::now()),
            started_at: None,
            finished_at: None,
            solver: None,
        }
    }

    /// Set the solver name.
    pub fn with_solver(mut self, solver: impl Into<String>) -> Self {
        self.solver = Some(solver.into());
        self
    }

    /// Update the status.
    ///
    /// Transitions that would move the job backwards are ignored.
    pub fn with_status(mut self, status: JobStatus) -> Self {
        if !self.status.can_transition_to(&status) {
            return self;
        }
        self.status = status;
        if matches!(self.status, JobStatus::Running) && self.started_at.is_none() {
            self.started_at = Some(Utc::now());
        }
        if self.status.is_terminal() && self.finished_at.is_none() {
            self.finished_at = Some(Utc::now());
        }
        self
    }

    /// Wall time between start (or creation) and finish, in milliseconds.
    pub fn elapsed_ms(&self) -> Option<u64> {
        let start = self.started_at.or(self.created_at)?;
        let end = self.finished_at?;
        u64::try_from((end - start).num_milliseconds()).ok()
    }
}

/// Make room for one more entry in a job cache bounded by `capacity`.
///
/// Finished jobs go first, oldest first; pending jobs are only dropped
/// when nothing else is left.
pub fn evict_jobs<K, V, S>(
    jobs: &mut HashMap<K, V, S>,
    capacity: usize,
    job_of: impl Fn(&V) -> &Job,
) where
    K: Clone + Eq + Hash,
    S: BuildHasher,
{
    if jobs.len() < capacity {
        return;
    }
    let excess = jobs.len() + 1 - capacity;
    let mut candidates: Vec<(bool, Option<DateTime<Utc>>, K)> = jobs
        .iter()
        .map(|(k, v)| {
            let job = job_of(v);
            (job.status.is_pending(), job.created_at, k.clone())
        })
        .collect();
    candidates.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
    for (_, _, key) in candidates.into_iter().take(excess) {
        jobs.remove(&key);
    }
    debug!("Evicted {} cached jobs", excess);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_terminal() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed("error".into()).is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_transitions_are_monotonic() {
        assert!(JobStatus::Queued.can_transition_to(&JobStatus::Running));
        assert!(JobStatus::Queued.can_transition_to(&JobStatus::Cancelled));
        assert!(JobStatus::Running.can_transition_to(&JobStatus::Completed));
        assert!(!JobStatus::Running.can_transition_to(&JobStatus::Queued));
        assert!(!JobStatus::Completed.can_transition_to(&JobStatus::Running));
        assert!(!JobStatus::Cancelled.can_transition_to(&JobStatus::Completed));
        assert!(JobStatus::Completed.can_transition_to(&JobStatus::Completed));
    }

    #[test]
    fn test_job_creation() {
        let job = Job::new("job-123", 50).with_solver("sim");

        assert_eq!(job.id.0, "job-123");
        assert_eq!(job.num_samples, 50);
        assert_eq!(job.solver, Some("sim".to_string()));
        assert!(job.created_at.is_some());
    }

    #[test]
    fn test_terminal_job_keeps_status() {
        let job = Job::new("job-1", 1)
            .with_status(JobStatus::Running)
            .with_status(JobStatus::Completed)
            .with_status(JobStatus::Running);
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.started_at.is_some());
        assert!(job.finished_at.is_some());
        assert!(job.elapsed_ms().is_some());
    }

    #[test]
    fn test_evict_prefers_finished_then_oldest() {
        let base = Utc::now();
        let job = |id: &str, status: JobStatus, age: i64| {
            let mut j = Job::new(id, 1).with_status(status);
            j.created_at = Some(base - chrono::Duration::seconds(age));
            j
        };
        let mut jobs: HashMap<String, Job> = HashMap::new();
        jobs.insert("old-pending".into(), job("old-pending", JobStatus::Queued, 30));
        jobs.insert("new-done".into(), job("new-done", JobStatus::Completed, 5));
        jobs.insert("old-done".into(), job("old-done", JobStatus::Completed, 20));

        evict_jobs(&mut jobs, 3, |j| j);
        assert_eq!(jobs.len(), 2);
        assert!(!jobs.contains_key("old-done"));

        evict_jobs(&mut jobs, 1, |j| j);
        assert_eq!(jobs.len(), 0);

        jobs.insert("a".into(), job("a", JobStatus::Running, 10));
        jobs.insert("b".into(), job("b", JobStatus::Queued, 1));
        evict_jobs(&mut jobs, 2, |j| j);
        assert!(jobs.contains_key("b"));
        assert!(!jobs.contains_key("a"));
    }

    #[test]
    fn test_evict_below_capacity_is_noop() {
        let mut jobs: HashMap<String, Job> = HashMap::new();
        jobs.insert("a".into(), Job::new("a", 1));
        evict_jobs(&mut jobs, 2, |j| j);
        assert_eq!(jobs.len(), 1);
    }
}
