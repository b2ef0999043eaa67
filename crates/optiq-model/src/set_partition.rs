//! Set partitioning as a QUBO.
//!
//! Given a universe `U = {0, …, m-1}` and a collection of subsets `S_j` with
//! costs `c_j`, choose `x ∈ {0,1}ᵏ` so that every element is covered exactly
//! once and `Σ c_j x_j` is minimal.
//!
//! With the `m × k` incidence matrix `A` the exact-cover constraint is
//! `Ax = 1`. Squaring the violation and using `x_j² = x_j`:
//!
//! ```text
//!   ‖Ax − 1‖² = xᵀ(AᵀA)x − 2·(Aᵀ1)ᵀx + m
//!
//!   Q = diag(c) + P·(AᵀA − 2·diag(Aᵀ1)),   offset = P·m
//! ```
//!
//! so `E(x) = cost(x) + P·Σᵢ (coveredᵢ(x) − 1)²`. Feasible assignments have
//! energy equal to their cost.

use std::fmt;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ModelError, ModelResult};
use crate::qubo::Qubo;

/// Constraint penalty weight `P`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Penalty {
    /// Use the given weight.
    Fixed(f64),
    /// `Σ|c_j| + 1`: any constraint violation costs more than the total
    /// spread of feasible objective values.
    #[default]
    Auto,
}

impl fmt::Display for Penalty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Penalty::Fixed(p) => write!(f, "{p}"),
            Penalty::Auto => write!(f, "auto"),
        }
    }
}

impl std::str::FromStr for Penalty {
    type Err = ModelError;

    fn from_str(s: &str) -> ModelResult<Self> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Penalty::Auto);
        }
        let p: f64 = s
            .parse()
            .map_err(|_| ModelError::InvalidProblem(format!("invalid penalty '{s}'")))?;
        if !p.is_finite() || p <= 0.0 {
            return Err(ModelError::InvalidProblem(format!(
                "penalty must be positive, got {p}"
            )));
        }
        Ok(Penalty::Fixed(p))
    }
}

/// A set-partitioning instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetPartition {
    /// Size of the universe; elements are `0..num_elements`.
    pub num_elements: usize,
    /// Candidate subsets.
    pub subsets: Vec<Vec<usize>>,
    /// Cost per subset. Defaults to 1 for every subset.
    #[serde(default)]
    pub costs: Vec<f64>,
}

impl SetPartition {
    /// Create an instance with unit costs.
    pub fn new(num_elements: usize, subsets: Vec<Vec<usize>>) -> ModelResult<Self> {
        let costs = vec![1.0; subsets.len()];
        let problem = Self {
            num_elements,
            subsets,
            costs,
        };
        problem.validate()?;
        Ok(problem)
    }

    /// Replace the subset costs.
    pub fn with_costs(mut self, costs: Vec<f64>) -> ModelResult<Self> {
        self.costs = costs;
        self.validate()?;
        Ok(self)
    }

    /// Check element ranges, empty subsets and cost length.
    ///
    /// An empty cost list means unit costs.
    pub fn validate(&self) -> ModelResult<()> {
        if self.subsets.is_empty() {
            return Err(ModelError::InvalidProblem("no subsets given".into()));
        }
        for (j, subset) in self.subsets.iter().enumerate() {
            if subset.is_empty() {
                return Err(ModelError::EmptySubset(j));
            }
            if let Some(&element) = subset.iter().find(|&&e| e >= self.num_elements) {
                return Err(ModelError::ElementOutOfRange {
                    subset: j,
                    element,
                    num_elements: self.num_elements,
                });
            }
        }
        if !self.costs.is_empty() && self.costs.len() != self.subsets.len() {
            return Err(ModelError::DimensionMismatch {
                expected: self.subsets.len(),
                actual: self.costs.len(),
            });
        }
        if self.costs.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::NonFinite("subset costs".into()));
        }
        Ok(())
    }

    /// Number of subsets (= QUBO variables).
    pub fn num_subsets(&self) -> usize {
        self.subsets.len()
    }

    /// Cost of subset `j` (1 when no costs were given).
    pub fn cost(&self, j: usize) -> f64 {
        self.costs.get(j).copied().unwrap_or(1.0)
    }

    /// The `m × k` 0/1 incidence matrix. Duplicate elements in a subset
    /// count once.
    pub fn incidence_matrix(&self) -> Array2<f64> {
        let mut a = Array2::zeros((self.num_elements, self.num_subsets()));
        for (j, subset) in self.subsets.iter().enumerate() {
            for &e in subset {
                a[[e, j]] = 1.0;
            }
        }
        a
    }

    /// Resolve a penalty to a concrete weight.
    pub fn penalty_weight(&self, penalty: Penalty) -> ModelResult<f64> {
        match penalty {
            Penalty::Fixed(p) if p.is_finite() && p > 0.0 => Ok(p),
            Penalty::Fixed(p) => Err(ModelError::InvalidProblem(format!(
                "penalty must be positive, got {p}"
            ))),
            Penalty::Auto => {
                Ok((0..self.num_subsets()).map(|j| self.cost(j).abs()).sum::<f64>() + 1.0)
            }
        }
    }

    /// Encode as a QUBO whose feasible energies equal their cost.
    pub fn to_qubo(&self, penalty: Penalty) -> ModelResult<Qubo> {
        self.validate()?;
        let p = self.penalty_weight(penalty)?;
        let a = self.incidence_matrix();
        let k = self.num_subsets();

        let coverage = a.t().dot(&a);
        let sizes = a.sum_axis(ndarray::Axis(0));
        let costs = Array1::from_iter((0..k).map(|j| self.cost(j)));

        let mut q = coverage * p;
        for j in 0..k {
            q[[j, j]] += costs[j] - 2.0 * p * sizes[j];
        }

        debug!(
            "Encoded set partitioning: {} elements, {} subsets, penalty {}",
            self.num_elements, k, p
        );

        Ok(Qubo::from_matrix(q)?.with_offset(p * self.num_elements as f64))
    }

    /// Interpret a binary assignment.
    pub fn check(&self, x: &[u8]) -> ModelResult<PartitionReport> {
        if x.len() != self.num_subsets() {
            return Err(ModelError::DimensionMismatch {
                expected: self.num_subsets(),
                actual: x.len(),
            });
        }

        let mut covered = vec![0u32; self.num_elements];
        let mut selected = Vec::new();
        let mut cost = 0.0;
        for (j, &bit) in x.iter().enumerate() {
            if bit != 0 {
                selected.push(j);
                cost += self.cost(j);
                let mut seen = rustc_hash::FxHashSet::default();
                for &e in &self.subsets[j] {
                    if seen.insert(e) {
                        covered[e] += 1;
                    }
                }
            }
        }

        let uncovered: Vec<usize> = (0..self.num_elements).filter(|&e| covered[e] == 0).collect();
        let overcovered: Vec<usize> = (0..self.num_elements).filter(|&e| covered[e] > 1).collect();
        let violation = covered
            .iter()
            .map(|&c| {
                let d = f64::from(c) - 1.0;
                d * d
            })
            .sum();

        Ok(PartitionReport {
            feasible: uncovered.is_empty() && overcovered.is_empty(),
            selected,
            cost,
            uncovered,
            overcovered,
            violation,
        })
    }

    /// Exhaustively find the cheapest exact cover (small instances only).
    pub fn brute_force_optimum(&self) -> Option<(Vec<u8>, f64)> {
        let k = self.num_subsets();
        if k > 24 {
            return None;
        }
        let mut best: Option<(Vec<u8>, f64)> = None;
        for mask in 0u32..(1u32 << k) {
            let x: Vec<u8> = (0..k).map(|j| ((mask >> j) & 1) as u8).collect();
            if let Ok(report) = self.check(&x) {
                if report.feasible && best.as_ref().is_none_or(|(_, c)| report.cost < *c) {
                    best = Some((x, report.cost));
                }
            }
        }
        best
    }
}

/// Outcome of checking one assignment against a set-partitioning instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionReport {
    /// Every element covered exactly once.
    pub feasible: bool,
    /// Indices of the chosen subsets.
    pub selected: Vec<usize>,
    /// Total cost of the chosen subsets.
    pub cost: f64,
    /// Elements covered by no chosen subset.
    pub uncovered: Vec<usize>,
    /// Elements covered more than once.
    pub overcovered: Vec<usize>,
    /// `Σᵢ (coveredᵢ − 1)²`.
    pub violation: f64,
}

/// Small reference instances.
pub mod instances {
    use super::SetPartition;
    use crate::error::ModelResult;

    /// Crew-pairing toy: six flight legs, eight candidate pairings.
    ///
    /// The optimum uses pairings 1, 4 and 6 (cost 9).
    pub fn small_crew() -> ModelResult<SetPartition> {
        SetPartition::new(
            6,
            vec![
                vec![0, 1, 2],
                vec![0, 1],
                vec![2, 3],
                vec![3, 4, 5],
                vec![2, 3],
                vec![1, 4],
                vec![4, 5],
                vec![0, 5],
            ],
        )?
        .with_costs(vec![5.0, 3.0, 4.0, 6.0, 2.0, 3.0, 4.0, 5.0])
    }

    /// Three disjoint singletons plus a covering triple: two exact covers.
    pub fn disjoint() -> ModelResult<SetPartition> {
        SetPartition::new(3, vec![vec![0], vec![1], vec![2], vec![0, 1, 2]])?
            .with_costs(vec![1.0, 1.0, 1.0, 2.5])
    }
}
