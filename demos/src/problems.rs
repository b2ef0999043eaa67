//! Problem instances used by the demos.

use optiq_model::set_partition::instances;
use optiq_model::{Hamiltonian, ModelError, ModelResult, SetPartition};

/// Names accepted by [`set_partition_instance`].
pub const SET_PARTITION_INSTANCES: &[&str] = &["small-crew", "disjoint"];

/// Look up a named set-partition instance.
pub fn set_partition_instance(name: &str) -> ModelResult<SetPartition> {
    match name.to_lowercase().as_str() {
        "small-crew" | "crew" => instances::small_crew(),
        "disjoint" => instances::disjoint(),
        other => Err(ModelError::InvalidProblem(format!(
            "unknown instance '{other}', available: {}",
            SET_PARTITION_INSTANCES.join(", ")
        ))),
    }
}

/// Mean-variance allocation `E(x) = xᵀΣx − λ·μᵀx`.
///
/// Under the device's sum constraint `Σx = R` the minimiser is a budget
/// split across assets trading expected return `μ` against covariance `Σ`.
pub fn allocation_hamiltonian(
    returns: &[f64],
    covariance: &[Vec<f64>],
    risk_aversion: f64,
) -> ModelResult<Hamiltonian> {
    let n = returns.len();
    if covariance.len() != n {
        return Err(ModelError::DimensionMismatch {
            expected: n,
            actual: covariance.len(),
        });
    }

    let mut h = Hamiltonian::new(n);
    for (i, mu) in returns.iter().enumerate() {
        h.add_linear(i, -risk_aversion * mu)?;
    }
    for (i, row) in covariance.iter().enumerate() {
        if row.len() != n {
            return Err(ModelError::DimensionMismatch {
                expected: n,
                actual: row.len(),
            });
        }
        for (j, &c) in row.iter().enumerate().skip(i) {
            // Σ is symmetric: the (i, j) and (j, i) entries meet in one term.
            let coeff = if i == j { c } else { 2.0 * c };
            h.add_quadratic(i, j, coeff)?;
        }
    }
    Ok(h)
}

/// Four assets with one low-risk, two correlated and one high-return.
pub fn demo_allocation() -> ModelResult<Hamiltonian> {
    let returns = [0.02, 0.06, 0.07, 0.12];
    let covariance = vec![
        vec![0.01, 0.00, 0.00, 0.00],
        vec![0.00, 0.04, 0.03, 0.00],
        vec![0.00, 0.03, 0.05, 0.01],
        vec![0.00, 0.00, 0.01, 0.10],
    ];
    allocation_hamiltonian(&returns, &covariance, 1.0)
}
