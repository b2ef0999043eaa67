//! Problems and the job configuration they are submitted with.

use optiq_model::{Hamiltonian, Objective, Polynomial, Qubo};
use serde::{Deserialize, Serialize};

use crate::capability::VariableDomain;
use crate::error::{HalError, HalResult};

/// Smallest sum constraint the qudit device accepts.
pub const MIN_SUM_CONSTRAINT: f64 = 1.0;
/// Largest sum constraint the qudit device accepts.
pub const MAX_SUM_CONSTRAINT: f64 = 10_000.0;
/// Sum constraint used when a continuous job does not set one.
pub const DEFAULT_SUM_CONSTRAINT: f64 = 1.0;
/// Valid relaxation schedules.
pub const RELAXATION_SCHEDULES: std::ops::RangeInclusive<u8> = 1..=4;

/// An encoded objective ready for submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Problem {
    /// Binary quadratic objective.
    Qubo(Qubo),
    /// Quadratic qudit objective in `[C | J]` form.
    Hamiltonian(Hamiltonian),
    /// Sparse higher-order objective.
    Polynomial(Polynomial),
}

impl Problem {
    /// Number of variables.
    pub fn num_variables(&self) -> usize {
        self.objective().num_variables()
    }

    /// Highest monomial degree.
    pub fn degree(&self) -> usize {
        match self {
            Problem::Qubo(_) | Problem::Hamiltonian(_) => 2,
            Problem::Polynomial(p) => p.max_degree(),
        }
    }

    /// Short name used in logs and file names.
    pub fn kind(&self) -> &'static str {
        match self {
            Problem::Qubo(_) => "qubo",
            Problem::Hamiltonian(_) => "hamiltonian",
            Problem::Polynomial(_) => "polynomial",
        }
    }

    /// The objective as a trait object, for local energy checks.
    pub fn objective(&self) -> &dyn Objective {
        match self {
            Problem::Qubo(q) => q,
            Problem::Hamiltonian(h) => h,
            Problem::Polynomial(p) => p,
        }
    }

    /// Sparse polynomial form of the objective over real-valued
    /// variables. QUBO diagonals stay square terms.
    pub fn to_polynomial(&self) -> Polynomial {
        match self {
            Problem::Qubo(q) => Polynomial::from_qubo_continuous(q),
            Problem::Hamiltonian(h) => h.to_polynomial(),
            Problem::Polynomial(p) => p.clone(),
        }
    }
}

impl From<Qubo> for Problem {
    fn from(q: Qubo) -> Self {
        Problem::Qubo(q)
    }
}

impl From<Hamiltonian> for Problem {
    fn from(h: Hamiltonian) -> Self {
        Problem::Hamiltonian(h)
    }
}

impl From<Polynomial> for Problem {
    fn from(p: Polynomial) -> Self {
        Problem::Polynomial(p)
    }
}

/// Target device family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceKind {
    /// Binary QUBO sampler.
    Dirac1,
    /// Qudit sampler (continuous or integer levels).
    Dirac3,
}

impl DeviceKind {
    /// Wire name of the device.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceKind::Dirac1 => "dirac-1",
            DeviceKind::Dirac3 => "dirac-3",
        }
    }

    /// Maximum samples per job.
    pub fn max_samples(&self) -> u32 {
        match self {
            DeviceKind::Dirac1 => 1_000,
            DeviceKind::Dirac3 => 100,
        }
    }

    /// The natural device for a problem: binary QUBOs go to dirac-1,
    /// everything else to dirac-3.
    pub fn for_problem(problem: &Problem) -> Self {
        match problem {
            Problem::Qubo(_) => DeviceKind::Dirac1,
            _ => DeviceKind::Dirac3,
        }
    }
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeviceKind {
    type Err = HalError;

    fn from_str(s: &str) -> HalResult<Self> {
        match s {
            "dirac-1" | "dirac1" => Ok(DeviceKind::Dirac1),
            "dirac-3" | "dirac3" => Ok(DeviceKind::Dirac3),
            other => Err(HalError::InvalidConfig(format!("unknown device '{other}'"))),
        }
    }
}

/// The service-side job type a problem/device pair maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobType {
    /// Binary QUBO sampling.
    SampleQubo,
    /// Continuous qudit sampling under a sum constraint.
    SampleHamiltonian,
    /// Integer-level qudit sampling.
    SampleHamiltonianInteger,
}

impl JobType {
    /// Wire name of the job type.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::SampleQubo => "sample-qubo",
            JobType::SampleHamiltonian => "sample-hamiltonian",
            JobType::SampleHamiltonianInteger => "sample-hamiltonian-integer",
        }
    }

    /// Variable domain sampled by this job type.
    pub fn domain(&self) -> VariableDomain {
        match self {
            JobType::SampleQubo => VariableDomain::Binary,
            JobType::SampleHamiltonian => VariableDomain::Continuous,
            JobType::SampleHamiltonianInteger => VariableDomain::Integer,
        }
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Target device.
    pub device: DeviceKind,
    /// Number of samples to draw.
    pub num_samples: u32,
    /// Relaxation schedule (1 to 4); device default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relaxation_schedule: Option<u8>,
    /// `Σ x_i = R` for continuous jobs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sum_constraint: Option<f64>,
    /// Granularity of returned continuous values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution_precision: Option<f64>,
    /// Levels per variable for integer jobs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_levels: Option<Vec<u32>>,
    /// Human-readable job name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_name: Option<String>,
    /// Free-form tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Seed for local solvers; ignored remotely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl JobConfig {
    /// A configuration for `device` with `num_samples` samples.
    pub fn new(device: DeviceKind, num_samples: u32) -> Self {
        Self {
            device,
            num_samples,
            relaxation_schedule: None,
            sum_constraint: None,
            solution_precision: None,
            num_levels: None,
            job_name: None,
            tags: Vec::new(),
            seed: None,
        }
    }

    /// A configuration on the natural device for `problem`.
    pub fn for_problem(problem: &Problem, num_samples: u32) -> Self {
        Self::new(DeviceKind::for_problem(problem), num_samples)
    }

    /// Set the relaxation schedule.
    pub fn with_relaxation_schedule(mut self, schedule: u8) -> Self {
        self.relaxation_schedule = Some(schedule);
        self
    }

    /// Set the sum constraint.
    pub fn with_sum_constraint(mut self, r: f64) -> Self {
        self.sum_constraint = Some(r);
        self
    }

    /// Set the solution precision.
    pub fn with_solution_precision(mut self, p: f64) -> Self {
        self.solution_precision = Some(p);
        self
    }

    /// Set integer levels per variable.
    pub fn with_num_levels(mut self, levels: Vec<u32>) -> Self {
        self.num_levels = Some(levels);
        self
    }

    /// Set the job name.
    pub fn with_job_name(mut self, name: impl Into<String>) -> Self {
        self.job_name = Some(name.into());
        self
    }

    /// Add a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Set the local solver seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sum constraint that applies to a continuous job.
    pub fn effective_sum_constraint(&self) -> f64 {
        self.sum_constraint.unwrap_or(DEFAULT_SUM_CONSTRAINT)
    }

    /// Check the settings on their own.
    pub fn validate(&self) -> HalResult<()> {
        let reasons = self.problems();
        if reasons.is_empty() {
            Ok(())
        } else {
            Err(HalError::InvalidConfig(reasons.join("; ")))
        }
    }

    /// Every reason the settings are invalid, empty when valid.
    pub fn problems(&self) -> Vec<String> {
        let mut reasons = Vec::new();
        let max = self.device.max_samples();
        if self.num_samples == 0 || self.num_samples > max {
            reasons.push(format!(
                "num_samples must be between 1 and {max} on {}, got {}",
                self.device, self.num_samples
            ));
        }
        if let Some(r) = self.relaxation_schedule {
            if !RELAXATION_SCHEDULES.contains(&r) {
                reasons.push(format!("relaxation_schedule must be 1 to 4, got {r}"));
            }
        }
        if let Some(r) = self.sum_constraint {
            if !(MIN_SUM_CONSTRAINT..=MAX_SUM_CONSTRAINT).contains(&r) {
                reasons.push(format!(
                    "sum_constraint must be in [{MIN_SUM_CONSTRAINT}, {MAX_SUM_CONSTRAINT}], got {r}"
                ));
            }
        }
        if let Some(p) = self.solution_precision {
            if p.is_nan() || p <= 0.0 {
                reasons.push(format!("solution_precision must be positive, got {p}"));
            } else if p > self.effective_sum_constraint() {
                reasons.push(format!(
                    "solution_precision {p} exceeds sum_constraint {}",
                    self.effective_sum_constraint()
                ));
            } else if !divides(p, self.effective_sum_constraint()) {
                reasons.push(format!(
                    "solution_precision {p} does not divide sum_constraint {}",
                    self.effective_sum_constraint()
                ));
            }
        }
        if let Some(levels) = &self.num_levels {
            if let Some(bad) = levels.iter().find(|&&l| l < 2) {
                reasons.push(format!("num_levels entries must be at least 2, got {bad}"));
            }
        }
        if self.device == DeviceKind::Dirac1
            && (self.sum_constraint.is_some()
                || self.relaxation_schedule.is_some()
                || self.solution_precision.is_some()
                || self.num_levels.is_some())
        {
            reasons.push("dirac-1 takes no qudit settings".into());
        }
        if self.num_levels.is_some() && self.sum_constraint.is_some() {
            reasons.push("integer jobs take num_levels, not sum_constraint".into());
        }
        reasons
    }

    /// The job type `problem` runs as under these settings.
    pub fn job_type(&self, problem: &Problem) -> HalResult<JobType> {
        match (self.device, problem) {
            (DeviceKind::Dirac1, Problem::Qubo(_)) => Ok(JobType::SampleQubo),
            (DeviceKind::Dirac1, other) => Err(HalError::InvalidProblem(format!(
                "dirac-1 samples binary QUBOs only, got a {}",
                other.kind()
            ))),
            (DeviceKind::Dirac3, _) if self.num_levels.is_some() => {
                Ok(JobType::SampleHamiltonianInteger)
            }
            (DeviceKind::Dirac3, _) => Ok(JobType::SampleHamiltonian),
        }
    }
}

/// True when `total` is a whole multiple of `step`, up to rounding.
fn divides(step: f64, total: f64) -> bool {
    let ratio = total / step;
    (ratio - ratio.round()).abs() <= 1e-9 * ratio.max(1.0)
}

impl Default for JobConfig {
    fn default() -> Self {
        Self::new(DeviceKind::Dirac1, 10)
    }
}
