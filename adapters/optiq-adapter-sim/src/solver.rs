//! Local solver implementation.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rustc_hash::FxHashMap;
use serde_json::json;
use tracing::{debug, instrument};
use uuid::Uuid;

use optiq_hal::{
    Capabilities, HalError, HalResult, Job, JobConfig, JobId, JobStatus, JobType, Problem,
    SolveResult, Solver, SolverAvailability, SolverConfig, SolverFactory, ValidationResult,
    check_against, evict_jobs,
};
use optiq_model::SampleSet;

use crate::binary::{self, EXHAUSTIVE_LIMIT};
use crate::qudit;

/// Variable limit when none is configured.
const DEFAULT_MAX_VARIABLES: u32 = 64;

/// Jobs kept in memory before the oldest finished ones are dropped.
const MAX_STORED_JOBS: usize = 1_000;

/// Annealing sweeps for each relaxation schedule; slower schedules sweep more.
pub fn sweeps_for_schedule(schedule: Option<u8>) -> usize {
    match schedule.unwrap_or(1) {
        1 => 100,
        2 => 250,
        3 => 500,
        _ => 1_000,
    }
}

struct SimJob {
    job: Job,
    result: Option<SolveResult>,
}

/// Local solver for testing and small instances.
///
/// Binary QUBOs up to 20 variables are enumerated exactly; larger ones are
/// annealed. Continuous jobs run a local search on the sum-constrained
/// simplex, integer jobs anneal over levels. Jobs run to completion inside
/// `submit`.
pub struct SimSolver {
    config: SolverConfig,
    capabilities: Capabilities,
    jobs: Arc<Mutex<FxHashMap<String, SimJob>>>,
    job_capacity: usize,
}

impl SimSolver {
    /// Create a simulator with default limits.
    pub fn new() -> Self {
        Self::with_max_variables(DEFAULT_MAX_VARIABLES)
    }

    /// Create a simulator accepting up to `max_variables` variables.
    pub fn with_max_variables(max_variables: u32) -> Self {
        Self {
            config: SolverConfig::new("sim"),
            capabilities: Capabilities::simulator(max_variables),
            jobs: Arc::new(Mutex::new(FxHashMap::default())),
            job_capacity: MAX_STORED_JOBS,
        }
    }

    /// Sample `problem` synchronously.
    #[instrument(skip(self, problem, config), fields(kind = problem.kind()))]
    fn run(&self, job_id: &JobId, problem: &Problem, config: &JobConfig) -> HalResult<SolveResult> {
        let start = Instant::now();
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let reads = config.num_samples as usize;
        let sweeps = sweeps_for_schedule(config.relaxation_schedule);
        let job_type = config.job_type(problem)?;

        debug!(
            "Sampling {} variables as {} ({} reads, seed {})",
            problem.num_variables(),
            job_type,
            reads,
            seed
        );

        let (algorithm, samples) = match (job_type, problem) {
            (JobType::SampleQubo, Problem::Qubo(q)) if q.num_variables() <= EXHAUSTIVE_LIMIT => {
                ("exhaustive", binary::exhaustive(q, reads)?)
            }
            (JobType::SampleQubo, Problem::Qubo(q)) => {
                ("annealing", binary::anneal(q, reads, sweeps, &mut rng)?)
            }
            (JobType::SampleQubo, other) => {
                return Err(HalError::InvalidProblem(format!(
                    "binary sampling needs a QUBO, got a {}",
                    other.kind()
                )));
            }
            (JobType::SampleHamiltonian, _) => (
                "simplex-search",
                qudit::simplex_search(
                    problem.objective(),
                    config.effective_sum_constraint(),
                    config.solution_precision,
                    reads,
                    &mut rng,
                )?,
            ),
            (JobType::SampleHamiltonianInteger, _) => {
                let levels = config.num_levels.as_deref().ok_or_else(|| {
                    HalError::InvalidConfig("integer jobs need num_levels".into())
                })?;
                (
                    "level-annealing",
                    qudit::anneal_levels(problem.objective(), levels, reads, sweeps, &mut rng)?,
                )
            }
        };

        let samples = SampleSet::aggregate(samples);
        let elapsed = start.elapsed();
        debug!(
            "Sampling finished in {:?}: {} distinct samples",
            elapsed,
            samples.len()
        );

        Ok(SolveResult::new(job_id.clone(), samples, "sim")
            .with_wall_time_ms(elapsed.as_millis() as u64)
            .with_metadata("algorithm", json!(algorithm))
            .with_metadata("seed", json!(seed))
            .with_metadata("job_type", json!(job_type.as_str())))
    }
}

impl Default for SimSolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Solver for SimSolver {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    async fn availability(&self) -> HalResult<SolverAvailability> {
        Ok(SolverAvailability::always_available())
    }

    async fn validate(&self, problem: &Problem, config: &JobConfig) -> HalResult<ValidationResult> {
        Ok(check_against(&self.capabilities, problem, config))
    }

    #[instrument(skip(self, problem, config))]
    async fn submit(&self, problem: &Problem, config: &JobConfig) -> HalResult<JobId> {
        check_against(&self.capabilities, problem, config).into_result()?;

        let job_id = JobId::new(Uuid::new_v4().to_string());
        let job = Job::new(job_id.clone(), config.num_samples).with_solver("sim");

        {
            let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
            evict_jobs(&mut *jobs, self.job_capacity, |j| &j.job);
            jobs.insert(job_id.0.clone(), SimJob { job, result: None });
        }
        debug!("Submitted job: {}", job_id);

        let outcome = self.run(&job_id, problem, config);

        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(sim_job) = jobs.get_mut(&job_id.0) {
            match outcome {
                Ok(result) => {
                    sim_job.job = sim_job.job.clone().with_status(JobStatus::Completed);
                    sim_job.result = Some(result);
                }
                Err(e) => {
                    sim_job.job = sim_job
                        .job
                        .clone()
                        .with_status(JobStatus::Failed(e.to_string()));
                }
            }
        }

        Ok(job_id)
    }

    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        let jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        jobs.get(&job_id.0)
            .map(|j| j.job.status.clone())
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))
    }

    async fn result(&self, job_id: &JobId) -> HalResult<SolveResult> {
        let jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        let sim_job = jobs
            .get(&job_id.0)
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))?;
        match (&sim_job.job.status, &sim_job.result) {
            (JobStatus::Completed, Some(result)) => Ok(result.clone()),
            (JobStatus::Failed(msg), _) => Err(HalError::JobFailed(msg.clone())),
            (JobStatus::Cancelled, _) => Err(HalError::JobCancelled),
            (status, _) => Err(HalError::Backend(format!(
                "job {job_id} has no result in state {status}"
            ))),
        }
    }

    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        let sim_job = jobs
            .get_mut(&job_id.0)
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))?;
        if sim_job.job.status.is_terminal() {
            debug!("Job {} already {}, nothing to cancel", job_id, sim_job.job.status);
        } else {
            sim_job.job = sim_job.job.clone().with_status(JobStatus::Cancelled);
        }
        Ok(())
    }
}

impl SolverFactory for SimSolver {
    fn from_config(config: SolverConfig) -> HalResult<Self> {
        let max_variables = match config.extra_u64("max_variables") {
            Some(v) => u32::try_from(v).map_err(|_| {
                HalError::InvalidConfig(format!("max_variables {v} is larger than {}", u32::MAX))
            })?,
            None => DEFAULT_MAX_VARIABLES,
        };

        Ok(Self {
            config,
            capabilities: Capabilities::simulator(max_variables),
            jobs: Arc::new(Mutex::new(FxHashMap::default())),
            job_capacity: MAX_STORED_JOBS,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use optiq_hal::DeviceKind;
    use optiq_model::interpret::{interpret_partition, verify_energies};
    use optiq_model::set_partition::instances;
    use optiq_model::{Hamiltonian, Penalty, Qubo};

    #[tokio::test]
    async fn test_capabilities() {
        let solver = SimSolver::new();
        let caps = solver.capabilities();
        assert!(caps.is_simulator);
        assert_eq!(caps.max_variables, 64);
        assert!(solver.availability().await.unwrap().is_available);
    }

    #[tokio::test]
    async fn test_set_partition_end_to_end() {
        let partition = instances::small_crew().unwrap();
        let qubo = partition.to_qubo(Penalty::Auto).unwrap();
        let problem = Problem::from(qubo);
        let config = JobConfig::new(DeviceKind::Dirac1, 5);

        let solver = SimSolver::new();
        let job_id = solver.submit(&problem, &config).await.unwrap();
        assert_eq!(solver.status(&job_id).await.unwrap(), JobStatus::Completed);

        let result = solver.wait(&job_id).await.unwrap();
        assert_eq!(result.best_energy(), Some(9.0));
        assert_eq!(result.metadata["algorithm"], "exhaustive");
        assert!(
            verify_energies(&result.samples, problem.objective(), 1e-9)
                .unwrap()
                .is_empty()
        );

        let summary = interpret_partition(&partition, &result.samples).unwrap();
        let best = summary.best().unwrap();
        assert_eq!(best.report.cost, 9.0);
    }

    #[tokio::test]
    async fn test_continuous_respects_sum_constraint() {
        let mut h = Hamiltonian::new(3);
        h.add_linear(0, 1.0).unwrap();
        h.add_quadratic(1, 1, 1.0).unwrap();
        h.add_quadratic(2, 2, 1.0).unwrap();
        let problem = Problem::from(h);
        let config = JobConfig::new(DeviceKind::Dirac3, 3)
            .with_sum_constraint(2.0)
            .with_solution_precision(0.1)
            .with_seed(42);

        let solver = SimSolver::new();
        let job_id = solver.submit(&problem, &config).await.unwrap();
        let result = solver.result(&job_id).await.unwrap();

        for sample in result.samples.iter() {
            assert!((sample.sum() - 2.0).abs() < 1e-9);
        }
        // x = (0, 1, 1) gives 2
        assert!((result.best_energy().unwrap() - 2.0).abs() < 1e-9);
        assert_eq!(result.metadata["seed"], 42);
    }

    #[tokio::test]
    async fn test_seed_reproducible() {
        let mut h = Hamiltonian::new(2);
        h.add_quadratic(0, 1, -1.0).unwrap();
        let problem = Problem::from(h);
        let config = JobConfig::new(DeviceKind::Dirac3, 4).with_seed(9);

        let solver = SimSolver::new();
        let a = solver.submit(&problem, &config).await.unwrap();
        let b = solver.submit(&problem, &config).await.unwrap();
        let a = solver.result(&a).await.unwrap();
        let b = solver.result(&b).await.unwrap();
        assert_eq!(a.samples, b.samples);
    }

    #[tokio::test]
    async fn test_rejects_oversized_problem() {
        let solver = SimSolver::with_max_variables(4);
        let problem = Problem::from(Qubo::new(5));
        let err = solver
            .submit(&problem, &JobConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, HalError::InvalidProblem(_)));
    }

    #[tokio::test]
    async fn test_rejects_hamiltonian_on_dirac1() {
        let solver = SimSolver::new();
        let problem = Problem::from(Hamiltonian::new(2));
        let validation = solver
            .validate(&problem, &JobConfig::default())
            .await
            .unwrap();
        assert!(!validation.is_valid());
    }

    #[tokio::test]
    async fn test_rejects_precision_off_grid() {
        let solver = SimSolver::new();
        let problem = Problem::from(Hamiltonian::new(2));
        let config = JobConfig::new(DeviceKind::Dirac3, 2).with_solution_precision(0.3);
        let err = solver.submit(&problem, &config).await.unwrap_err();
        assert!(matches!(err, HalError::InvalidProblem(msg) if msg.contains("does not divide")));
    }

    #[tokio::test]
    async fn test_job_store_is_bounded() {
        let mut solver = SimSolver::new();
        solver.job_capacity = 2;
        let problem = Problem::from(Qubo::from_terms(2, [(0, 0, -1.0)]).unwrap());
        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(solver.submit(&problem, &JobConfig::default()).await.unwrap());
        }
        assert_eq!(solver.jobs.lock().unwrap().len(), 2);
        assert!(solver.result(&ids[2]).await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let solver = SimSolver::new();
        let missing = JobId::new("nope");
        assert!(matches!(
            solver.status(&missing).await,
            Err(HalError::JobNotFound(_))
        ));
        assert!(matches!(
            solver.cancel(&missing).await,
            Err(HalError::JobNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_cancel_completed_job_keeps_result() {
        let solver = SimSolver::new();
        let problem = Problem::from(Qubo::from_terms(2, [(0, 0, -1.0)]).unwrap());
        let job_id = solver.submit(&problem, &JobConfig::default()).await.unwrap();
        solver.cancel(&job_id).await.unwrap();
        assert_eq!(solver.status(&job_id).await.unwrap(), JobStatus::Completed);
        assert!(solver.result(&job_id).await.is_ok());
    }

    #[test]
    fn test_from_config() {
        let config = SolverConfig::new("sim").with_extra("max_variables", json!(128));
        let solver = SimSolver::from_config(config).unwrap();
        assert_eq!(solver.capabilities().max_variables, 128);

        let config = SolverConfig::new("sim")
            .with_extra("max_variables", json!(u64::from(u32::MAX) + 1));
        assert!(matches!(
            SimSolver::from_config(config),
            Err(HalError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_sweeps_for_schedule() {
        assert_eq!(sweeps_for_schedule(None), 100);
        assert_eq!(sweeps_for_schedule(Some(4)), 1_000);
    }
}
