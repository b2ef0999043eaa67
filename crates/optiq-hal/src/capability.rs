//! Solver capability introspection.
//!
//! [`Capabilities`] describes what a solver accepts: which variable
//! domains, how many variables, how many samples per job and which
//! device settings it honours. Validation checks problems and job
//! configurations against it before anything is uploaded.

use serde::{Deserialize, Serialize};

/// Kind of decision variable a solver samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableDomain {
    /// 0/1 variables (QUBO).
    Binary,
    /// Non-negative reals under a sum constraint.
    Continuous,
    /// Integer levels `0..num_levels[i]`.
    Integer,
}

impl std::fmt::Display for VariableDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VariableDomain::Binary => write!(f, "binary"),
            VariableDomain::Continuous => write!(f, "continuous"),
            VariableDomain::Integer => write!(f, "integer"),
        }
    }
}

/// What a solver can do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Name of the solver.
    pub name: String,
    /// Variable domains the solver samples.
    pub domains: Vec<VariableDomain>,
    /// Maximum number of variables per problem.
    pub max_variables: u32,
    /// Maximum number of samples per job.
    pub max_samples: u32,
    /// Highest monomial degree accepted.
    pub max_degree: u32,
    /// Whether this is a local simulator.
    pub is_simulator: bool,
    /// Free-form feature flags, e.g. `"sum_constraint"`, `"relaxation_schedule"`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

impl Capabilities {
    /// The binary QUBO sampler (dirac-1).
    pub fn dirac1() -> Self {
        Self {
            name: "dirac-1".into(),
            domains: vec![VariableDomain::Binary],
            max_variables: 1_000,
            max_samples: 1_000,
            max_degree: 2,
            is_simulator: false,
            features: vec![],
        }
    }

    /// The qudit sampler (dirac-3), continuous or integer levels.
    pub fn dirac3() -> Self {
        Self {
            name: "dirac-3".into(),
            domains: vec![VariableDomain::Continuous, VariableDomain::Integer],
            max_variables: 949,
            max_samples: 100,
            max_degree: 5,
            is_simulator: false,
            features: vec!["sum_constraint".into(), "relaxation_schedule".into()],
        }
    }

    /// A local simulator supporting every domain.
    pub fn simulator(max_variables: u32) -> Self {
        Self {
            name: "sim".into(),
            domains: vec![
                VariableDomain::Binary,
                VariableDomain::Continuous,
                VariableDomain::Integer,
            ],
            max_variables,
            max_samples: 10_000,
            max_degree: 8,
            is_simulator: true,
            features: vec!["sum_constraint".into(), "relaxation_schedule".into()],
        }
    }

    /// Whether `domain` is sampled.
    pub fn supports(&self, domain: VariableDomain) -> bool {
        self.domains.contains(&domain)
    }

    /// Whether a feature flag is present.
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }
}
