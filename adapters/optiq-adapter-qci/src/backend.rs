//! QCi solver implementation.
//!
//! Implements the `Solver` trait on top of [`QciClient`]: problems are
//! uploaded as files, submitted as jobs on dirac-1 or dirac-3 and polled
//! until they finish.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use optiq_hal::{
    Capabilities, DeviceKind, HalError, HalResult, Job, JobConfig, JobId, JobStatus, JobType,
    Problem, SolveResult, Solver, SolverAvailability, SolverConfig, SolverFactory,
    ValidationResult, VariableDomain, WaitOptions, check_against, evict_jobs,
};

use crate::api::{QciClient, WireStatus};
use crate::error::{QciError, QciResult};
use crate::files::{FileUpload, energy_offset, job_body};

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = crate::api::BASE_URL;

/// Maximum number of jobs kept in the local cache.
const MAX_CACHED_JOBS: usize = 10_000;

/// Delay between status polls.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Give up waiting after this long.
pub(crate) const MAX_WAIT_TIME: Duration = Duration::from_secs(600);

struct CachedJob {
    job: Job,
    job_type: JobType,
    file_id: String,
    offset: f64,
    result: Option<SolveResult>,
}

/// Solver backed by the QCi hosted optimization service.
pub struct QciSolver {
    config: SolverConfig,
    client: QciClient,
    capabilities: Capabilities,
    jobs: Arc<Mutex<FxHashMap<String, CachedJob>>>,
}

impl QciSolver {
    /// Create a solver from `QCI_TOKEN` and (optionally) `QCI_API_URL`.
    pub fn new() -> QciResult<Self> {
        let token = std::env::var("QCI_TOKEN").map_err(|_| QciError::MissingToken)?;
        let base_url = std::env::var("QCI_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        Self::with_credentials(token, base_url)
    }

    /// Create a solver with explicit credentials.
    pub fn with_credentials(
        token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> QciResult<Self> {
        let token = token.into();
        let base_url = base_url.into();

        let config = SolverConfig::new("qci")
            .with_endpoint(&base_url)
            .with_token(&token);
        let client = QciClient::new(token)?.with_base_url(base_url);

        Ok(Self {
            config,
            client,
            capabilities: Self::combined_capabilities(),
            jobs: Arc::new(Mutex::new(FxHashMap::default())),
        })
    }

    fn from_config_impl(config: SolverConfig) -> QciResult<Self> {
        let token = config.token.as_ref().ok_or(QciError::MissingToken)?;
        let base_url = config
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let client = QciClient::new(token)?.with_base_url(base_url);

        Ok(Self {
            config,
            client,
            capabilities: Self::combined_capabilities(),
            jobs: Arc::new(Mutex::new(FxHashMap::default())),
        })
    }

    /// Union of the dirac-1 and dirac-3 limits; per-device limits are
    /// checked in `validate`.
    fn combined_capabilities() -> Capabilities {
        let d1 = Capabilities::dirac1();
        let d3 = Capabilities::dirac3();
        Capabilities {
            name: "qci".into(),
            domains: vec![
                VariableDomain::Binary,
                VariableDomain::Continuous,
                VariableDomain::Integer,
            ],
            max_variables: d1.max_variables.max(d3.max_variables),
            max_samples: d1.max_samples.max(d3.max_samples),
            max_degree: d1.max_degree.max(d3.max_degree),
            is_simulator: false,
            features: d3.features,
        }
    }

    fn device_capabilities(device: DeviceKind) -> Capabilities {
        match device {
            DeviceKind::Dirac1 => Capabilities::dirac1(),
            DeviceKind::Dirac3 => Capabilities::dirac3(),
        }
    }

    /// The underlying API client.
    pub fn client(&self) -> &QciClient {
        &self.client
    }

    fn map_job_error(job_id: &JobId, e: QciError) -> HalError {
        match e {
            QciError::NotFound(_) => HalError::JobNotFound(job_id.0.clone()),
            other => other.into(),
        }
    }

    async fn update_cached_status(&self, job_id: &JobId, status: &JobStatus) {
        let mut jobs = self.jobs.lock().await;
        if let Some(cached) = jobs.get_mut(&job_id.0) {
            cached.job = cached.job.clone().with_status(status.clone());
        }
    }
}

#[async_trait]
impl Solver for QciSolver {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    #[instrument(skip(self))]
    async fn availability(&self) -> HalResult<SolverAvailability> {
        match self.client.access_token().await {
            Ok(_) => Ok(SolverAvailability {
                is_available: true,
                queue_depth: None,
                status_message: Some(format!("Authenticated at {}", self.client.base_url())),
            }),
            Err(e) => {
                warn!("Availability check failed: {}", e);
                Ok(SolverAvailability::unavailable(e.to_string()))
            }
        }
    }

    async fn validate(
        &self,
        problem: &Problem,
        config: &JobConfig,
    ) -> HalResult<ValidationResult> {
        let caps = Self::device_capabilities(config.device);
        Ok(check_against(&caps, problem, config))
    }

    #[instrument(skip(self, problem, config), fields(kind = problem.kind(), device = %config.device))]
    async fn submit(&self, problem: &Problem, config: &JobConfig) -> HalResult<JobId> {
        info!(
            "Submitting {} with {} variables to {} ({} samples)",
            problem.kind(),
            problem.num_variables(),
            config.device,
            config.num_samples
        );

        self.validate(problem, config).await?.into_result()?;
        let job_type = config.job_type(problem)?;

        let file_name = config
            .job_name
            .clone()
            .unwrap_or_else(|| format!("optiq-{}", problem.kind()));
        let file = FileUpload::for_problem(file_name, problem, job_type);
        let upload = self.client.upload_file(&file).await?;
        debug!("File uploaded: {}", upload.file_id);

        let body = job_body(job_type, &upload.file_id, config);
        let response = self.client.create_job(&body).await?;

        let job_id = JobId::new(response.job_id);
        info!("Job submitted: {} ({})", job_id, job_type);

        let job = Job::new(job_id.clone(), config.num_samples).with_solver(config.device.as_str());
        {
            let mut jobs = self.jobs.lock().await;
            evict_jobs(&mut *jobs, MAX_CACHED_JOBS, |j| &j.job);
            jobs.insert(
                job_id.0.clone(),
                CachedJob {
                    job,
                    job_type,
                    file_id: upload.file_id,
                    offset: energy_offset(problem),
                    result: None,
                },
            );
        }

        Ok(job_id)
    }

    #[instrument(skip(self))]
    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        let response = self
            .client
            .get_status(&job_id.0)
            .await
            .map_err(|e| Self::map_job_error(job_id, e))?;

        let status = match response.wire_status()? {
            WireStatus::Queued => JobStatus::Queued,
            WireStatus::Running => JobStatus::Running,
            WireStatus::Completed => JobStatus::Completed,
            WireStatus::Errored => JobStatus::Failed("Job errored on the service".into()),
            WireStatus::Cancelled => JobStatus::Cancelled,
        };

        self.update_cached_status(job_id, &status).await;
        Ok(status)
    }

    #[instrument(skip(self))]
    async fn result(&self, job_id: &JobId) -> HalResult<SolveResult> {
        let (offset, job_type, file_id) = {
            let jobs = self.jobs.lock().await;
            match jobs.get(&job_id.0) {
                Some(cached) => {
                    if let Some(ref result) = cached.result {
                        return Ok(result.clone());
                    }
                    (
                        cached.offset,
                        Some(cached.job_type),
                        Some(cached.file_id.clone()),
                    )
                }
                None => (0.0, None, None),
            }
        };

        let response = self
            .client
            .get_job(&job_id.0)
            .await
            .map_err(|e| Self::map_job_error(job_id, e))?;

        match response.wire_status()? {
            WireStatus::Completed => {}
            WireStatus::Errored => {
                return Err(HalError::JobFailed(
                    response
                        .error_message
                        .unwrap_or_else(|| "Job errored on the service".into()),
                ));
            }
            WireStatus::Cancelled => return Err(HalError::JobCancelled),
            WireStatus::Queued | WireStatus::Running => {
                return Err(HalError::Backend(format!(
                    "Job {job_id} has not finished (status: {})",
                    response.status
                )));
            }
        }

        let results = response.results.ok_or_else(|| {
            QciError::MalformedResponse(format!("completed job {job_id} has no results"))
        })?;
        let raw = results.into_sample_set()?;
        let samples = optiq_model::SampleSet::new(
            raw.into_iter()
                .map(|mut s| {
                    s.energy += offset;
                    s
                })
                .collect(),
        )
        .sorted_by_energy();

        let device = response.device_type.unwrap_or_else(|| "qci".into());
        let mut result = SolveResult::new(job_id.clone(), samples, device)
            .with_metadata("provider", serde_json::json!("qci"))
            .with_metadata("energy_offset", serde_json::json!(offset));
        if let Some(job_type) = job_type {
            result = result.with_metadata("job_type", serde_json::json!(job_type.as_str()));
        }
        if let Some(file_id) = file_id {
            result = result.with_metadata("file_id", serde_json::json!(file_id));
        }

        {
            let mut jobs = self.jobs.lock().await;
            if let Some(cached) = jobs.get_mut(&job_id.0) {
                cached.job = cached.job.clone().with_status(JobStatus::Completed);
                if let Some(ms) = cached.job.elapsed_ms() {
                    result = result.with_wall_time_ms(ms);
                }
                cached.result = Some(result.clone());
            }
        }

        Ok(result)
    }

    #[instrument(skip(self))]
    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        self.client
            .cancel_job(&job_id.0)
            .await
            .map_err(|e| Self::map_job_error(job_id, e))?;

        self.update_cached_status(job_id, &JobStatus::Cancelled)
            .await;

        info!("Job cancelled: {}", job_id);
        Ok(())
    }

    async fn wait(&self, job_id: &JobId) -> HalResult<SolveResult> {
        self.wait_with(job_id, WaitOptions::new(POLL_INTERVAL, MAX_WAIT_TIME))
            .await
    }
}

impl SolverFactory for QciSolver {
    fn from_config(config: SolverConfig) -> HalResult<Self> {
        Ok(Self::from_config_impl(config)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use optiq_model::{Hamiltonian, Qubo};

    #[test]
    fn test_solver_config() {
        let config = SolverConfig::new("qci")
            .with_endpoint("http://localhost:9")
            .with_token("test-token");
        let solver = QciSolver::from_config(config).unwrap();
        assert_eq!(solver.name(), "qci");
        assert_eq!(solver.client().base_url(), "http://localhost:9");
        assert!(!solver.capabilities().is_simulator);
    }

    #[test]
    fn test_from_config_requires_token() {
        let result = QciSolver::from_config(SolverConfig::new("qci"));
        assert!(matches!(result, Err(HalError::AuthenticationFailed(_))));
    }

    #[tokio::test]
    async fn test_validate_uses_device_limits() {
        let solver = QciSolver::with_credentials("t", "http://localhost:9").unwrap();

        let q = Problem::Qubo(Qubo::new(4));
        let ok = JobConfig::for_problem(&q, 500);
        assert!(solver.validate(&q, &ok).await.unwrap().is_valid());

        let h = Problem::Hamiltonian(Hamiltonian::new(4));
        let too_many = JobConfig::for_problem(&h, 500);
        assert!(!solver.validate(&h, &too_many).await.unwrap().is_valid());

        let wrong_device = JobConfig::new(DeviceKind::Dirac1, 10);
        assert!(!solver.validate(&h, &wrong_device).await.unwrap().is_valid());
    }

    #[tokio::test]
    async fn test_submit_rejects_invalid_before_upload() {
        let solver = QciSolver::with_credentials("t", "http://localhost:9").unwrap();
        let q = Problem::Qubo(Qubo::new(2));
        let cfg = JobConfig::for_problem(&q, 0);
        let err = solver.submit(&q, &cfg).await.unwrap_err();
        assert!(matches!(err, HalError::InvalidProblem(_)));
    }
}
