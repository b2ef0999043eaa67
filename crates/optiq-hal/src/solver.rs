//! Solver trait and configuration.
//!
//! The [`Solver`] trait defines the lifecycle of a job on a local or
//! remote sampler:
//!
//! ```text
//!   capabilities() ──→ validate() ──→ submit() ──→ status() ──→ result()
//!    (sync, &ref)       (async)       (async)      (async)      (async)
//! ```
//!
//! | Method | Kind | Required | Returns |
//! |--------|------|----------|---------|
//! | `name()` | sync | yes | `&str` |
//! | `capabilities()` | sync | yes | `&Capabilities` |
//! | `availability()` | async | yes | `HalResult<SolverAvailability>` |
//! | `validate()` | async | yes | `HalResult<ValidationResult>` |
//! | `submit()` | async | yes | `HalResult<JobId>` |
//! | `status()` | async | yes | `HalResult<JobStatus>` |
//! | `result()` | async | yes | `HalResult<SolveResult>` |
//! | `cancel()` | async | yes | `HalResult<()>` |
//! | `wait()` | async | provided | `HalResult<SolveResult>` |

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::capability::Capabilities;
use crate::error::{HalError, HalResult};
use crate::job::{JobId, JobStatus};
use crate::problem::{JobConfig, Problem};
use crate::result::SolveResult;

/// Configuration for constructing a solver.
#[derive(Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Solver name.
    pub name: String,
    /// API endpoint (for remote solvers).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Refresh token. Never serialized.
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// Additional solver-specific settings.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SolverConfig {
    /// Create a new solver configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: None,
            token: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Set the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Add an extra setting.
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Read an extra setting as `u64`.
    pub fn extra_u64(&self, key: &str) -> Option<u64> {
        self.extra.get(key).and_then(serde_json::Value::as_u64)
    }
}

impl fmt::Debug for SolverConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolverConfig")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("token", &"[REDACTED]")
            .field("extra", &self.extra)
            .finish()
    }
}

/// Polling behaviour of [`Solver::wait_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Delay between status requests.
    pub poll_interval: Duration,
    /// Give up after this long.
    pub timeout: Duration,
}

impl WaitOptions {
    /// Create wait options.
    pub fn new(poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            poll_interval,
            timeout,
        }
    }
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            timeout: Duration::from_secs(300),
        }
    }
}

/// A sampler that accepts encoded problems.
#[async_trait]
pub trait Solver: Send + Sync {
    /// Solver name.
    fn name(&self) -> &str;

    /// Capabilities. Must not perform I/O.
    fn capabilities(&self) -> &Capabilities;

    /// Whether the solver is currently reachable.
    async fn availability(&self) -> HalResult<SolverAvailability>;

    /// Check a problem and configuration without submitting.
    async fn validate(&self, problem: &Problem, config: &JobConfig)
    -> HalResult<ValidationResult>;

    /// Submit a job. The job starts `Queued`.
    async fn submit(&self, problem: &Problem, config: &JobConfig) -> HalResult<JobId>;

    /// Current status of a job.
    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus>;

    /// Results of a completed job.
    async fn result(&self, job_id: &JobId) -> HalResult<SolveResult>;

    /// Cancel a job.
    async fn cancel(&self, job_id: &JobId) -> HalResult<()>;

    /// Wait with the default poll interval and timeout.
    async fn wait(&self, job_id: &JobId) -> HalResult<SolveResult> {
        self.wait_with(job_id, WaitOptions::default()).await
    }

    /// Poll until the job is terminal.
    ///
    /// Failed and cancelled jobs become errors.
    async fn wait_with(&self, job_id: &JobId, options: WaitOptions) -> HalResult<SolveResult> {
        use tokio::time::{Instant, sleep};

        let deadline = Instant::now() + options.timeout;
        loop {
            let status = self.status(job_id).await?;
            debug!("Job {} status: {}", job_id, status);

            match status {
                JobStatus::Completed => return self.result(job_id).await,
                JobStatus::Failed(msg) => return Err(HalError::JobFailed(msg)),
                JobStatus::Cancelled => return Err(HalError::JobCancelled),
                JobStatus::Queued | JobStatus::Running => {
                    if Instant::now() + options.poll_interval > deadline {
                        return Err(HalError::Timeout(job_id.0.clone()));
                    }
                    sleep(options.poll_interval).await;
                }
            }
        }
    }
}

/// Solver availability.
#[derive(Debug, Clone)]
pub struct SolverAvailability {
    /// Whether the solver accepts jobs.
    pub is_available: bool,
    /// Jobs ahead in the queue, when known.
    pub queue_depth: Option<u32>,
    /// Human-readable status.
    pub status_message: Option<String>,
}

impl SolverAvailability {
    /// Always available (local solvers).
    pub fn always_available() -> Self {
        Self {
            is_available: true,
            queue_depth: Some(0),
            status_message: None,
        }
    }

    /// Unavailable with a reason.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            is_available: false,
            queue_depth: None,
            status_message: Some(reason.into()),
        }
    }
}

/// Outcome of [`Solver::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Problem and settings can be submitted.
    Valid,
    /// Problem or settings are rejected.
    Invalid {
        /// Why.
        reasons: Vec<String>,
    },
}

impl ValidationResult {
    /// Check if the result is valid.
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    /// Turn an invalid result into [`HalError::InvalidProblem`].
    pub fn into_result(self) -> HalResult<()> {
        match self {
            ValidationResult::Valid => Ok(()),
            ValidationResult::Invalid { reasons } => {
                Err(HalError::InvalidProblem(reasons.join("; ")))
            }
        }
    }
}

/// Check a problem and configuration against solver capabilities.
///
/// Shared by solver implementations.
pub fn check_against(
    caps: &Capabilities,
    problem: &Problem,
    config: &JobConfig,
) -> ValidationResult {
    let mut reasons = config.problems();
    let n = problem.num_variables();

    if n == 0 {
        reasons.push("problem has no variables".into());
    }
    if n > caps.max_variables as usize {
        reasons.push(format!(
            "{n} variables exceed the {} limit of {}",
            caps.name, caps.max_variables
        ));
    }
    if problem.degree() > caps.max_degree as usize {
        reasons.push(format!(
            "degree {} exceeds the {} limit of {}",
            problem.degree(),
            caps.name,
            caps.max_degree
        ));
    }
    if config.num_samples > caps.max_samples {
        reasons.push(format!(
            "{} samples exceed the {} limit of {}",
            config.num_samples, caps.name, caps.max_samples
        ));
    }
    match config.job_type(problem) {
        Ok(job_type) => {
            if !caps.supports(job_type.domain()) {
                reasons.push(format!(
                    "{} does not sample {} variables",
                    caps.name,
                    job_type.domain()
                ));
            }
        }
        Err(e) => reasons.push(e.to_string()),
    }
    if let Some(levels) = &config.num_levels {
        if levels.len() != n {
            reasons.push(format!(
                "num_levels has {} entries for {n} variables",
                levels.len()
            ));
        }
    }

    if reasons.is_empty() {
        ValidationResult::Valid
    } else {
        ValidationResult::Invalid { reasons }
    }
}

/// Factory trait for creating solvers from configuration.
pub trait SolverFactory: Solver + Sized {
    /// Create a solver from configuration.
    fn from_config(config: SolverConfig) -> HalResult<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::DeviceKind;
    use optiq_model::{Hamiltonian, Qubo, Sample, SampleSet};
    use std::sync::Mutex;

    #[test]
    fn test_solver_config() {
        let config = SolverConfig::new("qci")
            .with_endpoint("https://api.example.com")
            .with_token("secret-token")
            .with_extra("timeout", serde_json::json!(30));

        assert_eq!(config.name, "qci");
        assert_eq!(config.endpoint, Some("https://api.example.com".to_string()));
        assert_eq!(config.token, Some("secret-token".to_string()));
        assert_eq!(config.extra_u64("timeout"), Some(30));
    }

    #[test]
    fn test_solver_config_debug_redacts_token() {
        let config = SolverConfig::new("qci").with_token("super-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_solver_config_never_serializes_token() {
        let config = SolverConfig::new("qci").with_token("super-secret");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("super-secret"));
    }

    #[test]
    fn test_availability() {
        assert!(SolverAvailability::always_available().is_available);
        let avail = SolverAvailability::unavailable("maintenance");
        assert!(!avail.is_available);
        assert_eq!(avail.status_message, Some("maintenance".to_string()));
    }

    #[test]
    fn test_check_against_limits() {
        let caps = Capabilities::dirac1();
        let ok = Problem::Qubo(Qubo::new(4));
        let cfg = JobConfig::for_problem(&ok, 10);
        assert!(check_against(&caps, &ok, &cfg).is_valid());

        let big = Problem::Qubo(Qubo::new(1_001));
        assert!(!check_against(&caps, &big, &cfg).is_valid());

        let h = Problem::Hamiltonian(Hamiltonian::new(2));
        let cfg = JobConfig::new(DeviceKind::Dirac3, 10);
        match check_against(&caps, &h, &cfg) {
            ValidationResult::Invalid { reasons } => {
                assert!(reasons.iter().any(|r| r.contains("continuous")));
            }
            ValidationResult::Valid => panic!("dirac-1 accepted a continuous job"),
        }
    }

    #[test]
    fn test_check_against_levels_length() {
        let caps = Capabilities::dirac3();
        let h = Problem::Hamiltonian(Hamiltonian::new(3));
        let cfg = JobConfig::new(DeviceKind::Dirac3, 5).with_num_levels(vec![4, 4]);
        assert!(!check_against(&caps, &h, &cfg).is_valid());
        let cfg = JobConfig::new(DeviceKind::Dirac3, 5).with_num_levels(vec![4, 4, 4]);
        assert!(check_against(&caps, &h, &cfg).is_valid());
    }

    /// Replays a fixed sequence of statuses.
    struct Scripted {
        caps: Capabilities,
        statuses: Mutex<Vec<JobStatus>>,
    }

    impl Scripted {
        fn new(mut statuses: Vec<JobStatus>) -> Self {
            statuses.reverse();
            Self {
                caps: Capabilities::simulator(8),
                statuses: Mutex::new(statuses),
            }
        }
    }

    #[async_trait]
    impl Solver for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn capabilities(&self) -> &Capabilities {
            &self.caps
        }

        async fn availability(&self) -> HalResult<SolverAvailability> {
            Ok(SolverAvailability::always_available())
        }

        async fn validate(
            &self,
            problem: &Problem,
            config: &JobConfig,
        ) -> HalResult<ValidationResult> {
            Ok(check_against(&self.caps, problem, config))
        }

        async fn submit(&self, _: &Problem, _: &JobConfig) -> HalResult<JobId> {
            Ok(JobId::new("job"))
        }

        async fn status(&self, _: &JobId) -> HalResult<JobStatus> {
            let mut statuses = self.statuses.lock().unwrap();
            Ok(if statuses.len() > 1 {
                statuses.pop().unwrap()
            } else {
                statuses[0].clone()
            })
        }

        async fn result(&self, job_id: &JobId) -> HalResult<SolveResult> {
            let samples = SampleSet::new(vec![Sample::new(vec![1.0], -1.0)]);
            Ok(SolveResult::new(job_id.clone(), samples, "scripted"))
        }

        async fn cancel(&self, _: &JobId) -> HalResult<()> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_completed() {
        let solver = Scripted::new(vec![
            JobStatus::Queued,
            JobStatus::Running,
            JobStatus::Completed,
        ]);
        let result = solver.wait(&JobId::new("job")).await.unwrap();
        assert_eq!(result.best_energy(), Some(-1.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_surfaces_failure() {
        let solver = Scripted::new(vec![JobStatus::Running, JobStatus::Failed("boom".into())]);
        let err = solver.wait(&JobId::new("job")).await.unwrap_err();
        assert!(matches!(err, HalError::JobFailed(msg) if msg == "boom"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_surfaces_cancel() {
        let solver = Scripted::new(vec![JobStatus::Cancelled]);
        let err = solver.wait(&JobId::new("job")).await.unwrap_err();
        assert!(matches!(err, HalError::JobCancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out() {
        let solver = Scripted::new(vec![JobStatus::Running]);
        let options = WaitOptions::new(Duration::from_secs(1), Duration::from_secs(5));
        let err = solver
            .wait_with(&JobId::new("job"), options)
            .await
            .unwrap_err();
        assert!(matches!(err, HalError::Timeout(_)));
    }
}
