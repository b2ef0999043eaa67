//! Interpreting solver samples against the original problem.
//!
//! Energies reported by a remote solver are recomputed locally, binary
//! samples are checked for exact coverage, and continuous samples are
//! checked against the sum constraint they were solved under.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ModelResult;
use crate::objective::Objective;
use crate::sample::{Sample, SampleSet};
use crate::set_partition::{PartitionReport, SetPartition};

/// Default tolerance when rounding returned values to 0/1.
pub const BINARY_TOLERANCE: f64 = 1e-6;

/// A sample whose reported energy disagrees with the local objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyMismatch {
    /// Position in the sample set.
    pub index: usize,
    /// Energy reported by the solver.
    pub reported: f64,
    /// Energy recomputed locally.
    pub computed: f64,
}

/// Recompute every sample's energy and collect the disagreements.
///
/// `tol` is relative to `max(1, |computed|)`.
pub fn verify_energies(
    samples: &SampleSet,
    objective: &dyn Objective,
    tol: f64,
) -> ModelResult<Vec<EnergyMismatch>> {
    let mut mismatches = Vec::new();
    for (index, sample) in samples.iter().enumerate() {
        let computed = objective.evaluate(&sample.values)?;
        let scale = computed.abs().max(1.0);
        if (computed - sample.energy).abs() > tol * scale {
            mismatches.push(EnergyMismatch {
                index,
                reported: sample.energy,
                computed,
            });
        }
    }
    if !mismatches.is_empty() {
        warn!(
            "{} of {} samples report energies that differ from the local objective",
            mismatches.len(),
            samples.len()
        );
    }
    Ok(mismatches)
}

/// One sample checked against a set-partitioning instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckedPartition {
    /// Rounded assignment.
    pub assignment: Vec<u8>,
    /// Energy reported by the solver.
    pub energy: f64,
    /// Occurrence count.
    pub count: u32,
    /// Coverage report.
    pub report: PartitionReport,
}

/// Summary over all samples of a set-partitioning job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionSummary {
    /// Per-sample results, in sample order.
    pub samples: Vec<CheckedPartition>,
    /// Index into `samples` of the cheapest feasible sample.
    pub best_feasible: Option<usize>,
    /// Fraction of reads (weighted by count) that were feasible.
    pub feasible_fraction: f64,
}

impl PartitionSummary {
    /// The cheapest feasible sample, if any.
    pub fn best(&self) -> Option<&CheckedPartition> {
        self.best_feasible.map(|i| &self.samples[i])
    }
}

/// Check every sample of a set-partitioning job.
pub fn interpret_partition(
    problem: &SetPartition,
    samples: &SampleSet,
) -> ModelResult<PartitionSummary> {
    let mut checked = Vec::with_capacity(samples.len());
    let mut feasible_reads = 0u64;
    let mut best_feasible: Option<usize> = None;

    for sample in samples.iter() {
        let assignment = sample.as_binary(BINARY_TOLERANCE)?;
        let report = problem.check(&assignment)?;
        if report.feasible {
            feasible_reads += u64::from(sample.count);
            let better = best_feasible.is_none_or(|b: usize| {
                let current: &CheckedPartition = &checked[b];
                report.cost < current.report.cost
            });
            if better {
                best_feasible = Some(checked.len());
            }
        }
        checked.push(CheckedPartition {
            assignment,
            energy: sample.energy,
            count: sample.count,
            report,
        });
    }

    let total = samples.total_count();
    let feasible_fraction = if total == 0 {
        0.0
    } else {
        feasible_reads as f64 / total as f64
    };
    debug!(
        "Set partitioning: {}/{} reads feasible",
        feasible_reads, total
    );

    Ok(PartitionSummary {
        samples: checked,
        best_feasible,
        feasible_fraction,
    })
}

/// True when `Σ values` is within `tol` of `target`.
pub fn check_sum_constraint(values: &[f64], target: f64, tol: f64) -> bool {
    (values.iter().sum::<f64>() - target).abs() <= tol
}

/// One continuous sample checked against its objective and constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuousReport {
    /// Locally recomputed energy.
    pub energy: f64,
    /// `Σ x_i`.
    pub sum: f64,
    /// Whether the sum constraint (if any) holds.
    pub sum_ok: bool,
    /// Smallest value; negative values violate the device's domain.
    pub min_value: f64,
}

/// Check a continuous sample. Without a sum constraint only energy and
/// bounds are reported.
pub fn interpret_continuous(
    objective: &dyn Objective,
    sample: &Sample,
    sum_constraint: Option<f64>,
    tol: f64,
) -> ModelResult<ContinuousReport> {
    let energy = objective.evaluate(&sample.values)?;
    let sum = sample.sum();
    let sum_ok = sum_constraint.is_none_or(|r| check_sum_constraint(&sample.values, r, tol));
    let min_value = sample
        .values
        .iter()
        .copied()
        .fold(f64::INFINITY, f64::min);
    Ok(ContinuousReport {
        energy,
        sum,
        sum_ok,
        min_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hamiltonian::Hamiltonian;
    use crate::qubo::Qubo;
    use crate::set_partition::{Penalty, instances};

    #[test]
    fn test_verify_energies_flags_mismatch() {
        let q = Qubo::from_terms(2, [(0, 0, -1.0), (0, 1, 2.0)]).unwrap();
        let samples = SampleSet::new(vec![
            Sample::new(vec![1.0, 0.0], -1.0),
            Sample::new(vec![1.0, 1.0], 5.0),
        ]);
        let mismatches = verify_energies(&samples, &q, 1e-9).unwrap();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].index, 1);
        assert_eq!(mismatches[0].computed, 1.0);
    }

    #[test]
    fn test_interpret_partition() {
        let p = instances::disjoint().unwrap();
        let q = p.to_qubo(Penalty::Auto).unwrap();
        let assignments = [
            vec![0.0, 0.0, 0.0, 1.0],
            vec![1.0, 1.0, 1.0, 0.0],
            vec![1.0, 0.0, 0.0, 1.0],
        ];
        let samples = SampleSet::new(
            assignments
                .iter()
                .map(|x| Sample::new(x.clone(), q.energy(x).unwrap()).with_count(2))
                .collect(),
        );
        let summary = interpret_partition(&p, &samples).unwrap();
        assert_eq!(summary.best_feasible, Some(0));
        assert_eq!(summary.best().unwrap().report.cost, 2.5);
        assert!((summary.feasible_fraction - 4.0 / 6.0).abs() < 1e-12);
        assert!(!summary.samples[2].report.feasible);
    }

    #[test]
    fn test_interpret_partition_rejects_fractional() {
        let p = instances::disjoint().unwrap();
        let samples = SampleSet::new(vec![Sample::new(vec![0.5, 0.0, 0.0, 1.0], 0.0)]);
        assert!(interpret_partition(&p, &samples).is_err());
    }

    #[test]
    fn test_interpret_continuous() {
        let mut h = Hamiltonian::new(2);
        h.add_quadratic(0, 1, 1.0).unwrap();
        let sample = Sample::new(vec![0.25, 0.75], 0.1875);
        let report = interpret_continuous(&h, &sample, Some(1.0), 1e-9).unwrap();
        assert!(report.sum_ok);
        assert!((report.energy - 0.1875).abs() < 1e-12);
        assert_eq!(report.min_value, 0.25);

        let report = interpret_continuous(&h, &sample, Some(2.0), 1e-9).unwrap();
        assert!(!report.sum_ok);
    }

    #[test]
    fn test_check_sum_constraint() {
        assert!(check_sum_constraint(&[0.5, 0.5], 1.0, 1e-12));
        assert!(!check_sum_constraint(&[0.5, 0.6], 1.0, 1e-3));
    }
}
