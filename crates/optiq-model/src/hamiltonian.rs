//! Qudit Hamiltonians in coefficient-matrix form.
//!
//! A quadratic Hamiltonian over `n` bounded variables is written as
//!
//!   E(x) = Σᵢ Cᵢ xᵢ + Σᵢⱼ Jᵢⱼ xᵢ xⱼ
//!
//! and submitted as the `n × (n + 1)` matrix `H = [C | J]`, the linear
//! column first. Unlike a QUBO the variables are continuous (or integer
//! levels), so linear and diagonal quadratic terms are distinct.
//!
//! # Example
//!
//! ```rust
//! use optiq_model::Hamiltonian;
//!
//! // E(x) = -x₀ + x₀² + x₀x₁
//! let mut h = Hamiltonian::new(2);
//! h.add_linear(0, -1.0).unwrap();
//! h.add_quadratic(0, 0, 1.0).unwrap();
//! h.add_quadratic(0, 1, 1.0).unwrap();
//!
//! let e = h.energy(&[0.5, 0.5]).unwrap();
//! assert!((e - (-0.5 + 0.25 + 0.25)).abs() < 1e-12);
//! ```

use ndarray::{Array1, Array2, ArrayView1, s};
use serde::{Deserialize, Serialize};

use crate::dense::{array_to_rows, ensure_finite, ensure_square, rows_to_array, symmetrize};
use crate::error::{ModelError, ModelResult};
use crate::polynomial::Polynomial;

/// A quadratic Hamiltonian `[C | J]` with `J` symmetric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "HamiltonianRepr", into = "HamiltonianRepr")]
pub struct Hamiltonian {
    linear: Array1<f64>,
    quadratic: Array2<f64>,
}

impl Hamiltonian {
    /// Create an all-zero Hamiltonian over `n` variables.
    pub fn new(n: usize) -> Self {
        Self {
            linear: Array1::zeros(n),
            quadratic: Array2::zeros((n, n)),
        }
    }

    /// Build from a linear vector and a quadratic block.
    pub fn from_parts(linear: Array1<f64>, quadratic: Array2<f64>) -> ModelResult<Self> {
        let n = ensure_square(&quadratic)?;
        if linear.len() != n {
            return Err(ModelError::DimensionMismatch {
                expected: n,
                actual: linear.len(),
            });
        }
        ensure_finite(linear.iter(), "linear coefficients")?;
        ensure_finite(quadratic.iter(), "quadratic coefficients")?;
        Ok(Self {
            linear,
            quadratic: symmetrize(&quadratic),
        })
    }

    /// Build from the `n × (n + 1)` coefficient matrix `[C | J]`.
    pub fn from_coefficient_matrix(matrix: &Array2<f64>) -> ModelResult<Self> {
        let (rows, cols) = matrix.dim();
        if cols != rows + 1 {
            return Err(ModelError::DimensionMismatch {
                expected: rows + 1,
                actual: cols,
            });
        }
        let linear = matrix.column(0).to_owned();
        let quadratic = matrix.slice(s![.., 1..]).to_owned();
        Self::from_parts(linear, quadratic)
    }

    /// The `n × (n + 1)` coefficient matrix `[C | J]`.
    pub fn to_coefficient_matrix(&self) -> Array2<f64> {
        let n = self.num_variables();
        let mut out = Array2::zeros((n, n + 1));
        out.column_mut(0).assign(&self.linear);
        out.slice_mut(s![.., 1..]).assign(&self.quadratic);
        out
    }

    /// Number of variables.
    pub fn num_variables(&self) -> usize {
        self.linear.len()
    }

    /// Linear coefficients `C`.
    pub fn linear(&self) -> &Array1<f64> {
        &self.linear
    }

    /// Symmetric quadratic block `J`.
    pub fn quadratic(&self) -> &Array2<f64> {
        &self.quadratic
    }

    fn check_index(&self, index: usize) -> ModelResult<()> {
        if index < self.num_variables() {
            Ok(())
        } else {
            Err(ModelError::VariableOutOfRange {
                index,
                num_variables: self.num_variables(),
            })
        }
    }

    /// Add `value · xᵢ`.
    pub fn add_linear(&mut self, i: usize, value: f64) -> ModelResult<()> {
        self.check_index(i)?;
        self.linear[i] += value;
        Ok(())
    }

    /// Add `value · xᵢ xⱼ` (`i == j` is a square term).
    pub fn add_quadratic(&mut self, i: usize, j: usize, value: f64) -> ModelResult<()> {
        self.check_index(i)?;
        self.check_index(j)?;
        if i == j {
            self.quadratic[[i, i]] += value;
        } else {
            let half = value / 2.0;
            self.quadratic[[i, j]] += half;
            self.quadratic[[j, i]] += half;
        }
        Ok(())
    }

    /// Energy `C·x + xᵀJx`.
    pub fn energy(&self, x: &[f64]) -> ModelResult<f64> {
        if x.len() != self.num_variables() {
            return Err(ModelError::DimensionMismatch {
                expected: self.num_variables(),
                actual: x.len(),
            });
        }
        let x = ArrayView1::from(x);
        Ok(self.linear.dot(&x) + x.dot(&self.quadratic.dot(&x)))
    }

    /// Gradient `C + 2Jx` (J is symmetric).
    pub fn gradient(&self, x: &[f64]) -> ModelResult<Array1<f64>> {
        if x.len() != self.num_variables() {
            return Err(ModelError::DimensionMismatch {
                expected: self.num_variables(),
                actual: x.len(),
            });
        }
        let x = ArrayView1::from(x);
        Ok(&self.linear + &(self.quadratic.dot(&x) * 2.0))
    }

    /// Largest absolute coefficient across `C` and `J`.
    pub fn max_abs_coefficient(&self) -> f64 {
        self.linear
            .iter()
            .chain(self.quadratic.iter())
            .fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }

    /// Convert to the sparse polynomial form.
    pub fn to_polynomial(&self) -> Polynomial {
        let n = self.num_variables();
        let mut poly = Polynomial::new(n);
        for (i, &c) in self.linear.iter().enumerate() {
            poly.insert(vec![i], c);
        }
        for i in 0..n {
            for j in i..n {
                let v = if i == j {
                    self.quadratic[[i, i]]
                } else {
                    2.0 * self.quadratic[[i, j]]
                };
                poly.insert(vec![i, j], v);
            }
        }
        poly
    }
}

/// On-disk form.
#[derive(Serialize, Deserialize)]
struct HamiltonianRepr {
    linear: Vec<f64>,
    quadratic: Vec<Vec<f64>>,
}

impl TryFrom<HamiltonianRepr> for Hamiltonian {
    type Error = ModelError;

    fn try_from(repr: HamiltonianRepr) -> ModelResult<Self> {
        let quadratic = if repr.quadratic.is_empty() {
            Array2::zeros((repr.linear.len(), repr.linear.len()))
        } else {
            rows_to_array(&repr.quadratic)?
        };
        Hamiltonian::from_parts(Array1::from(repr.linear), quadratic)
    }
}

impl From<Hamiltonian> for HamiltonianRepr {
    fn from(h: Hamiltonian) -> Self {
        Self {
            linear: h.linear.to_vec(),
            quadratic: array_to_rows(&h.quadratic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_coefficient_matrix_roundtrip() {
        let m = array![[1.0, 2.0, 0.5], [-1.0, 0.5, 3.0]];
        let h = Hamiltonian::from_coefficient_matrix(&m).unwrap();
        assert_eq!(h.linear(), &array![1.0, -1.0]);
        assert_eq!(h.to_coefficient_matrix(), m);
    }

    #[test]
    fn test_coefficient_matrix_wrong_shape() {
        let m = Array2::zeros((2, 2));
        assert!(Hamiltonian::from_coefficient_matrix(&m).is_err());
    }

    #[test]
    fn test_from_parts_mismatch() {
        let err = Hamiltonian::from_parts(Array1::zeros(3), Array2::zeros((2, 2))).unwrap_err();
        assert!(matches!(
            err,
            ModelError::DimensionMismatch { expected: 2, actual: 3 }
        ));
    }

    #[test]
    fn test_energy_continuous() {
        let mut h = Hamiltonian::new(2);
        h.add_linear(1, 2.0).unwrap();
        h.add_quadratic(0, 1, -4.0).unwrap();
        // 2·0.5 - 4·1.5·0.5
        assert!((h.energy(&[1.5, 0.5]).unwrap() - (1.0 - 3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_gradient() {
        let mut h = Hamiltonian::new(2);
        h.add_linear(0, 1.0).unwrap();
        h.add_quadratic(0, 0, 1.0).unwrap();
        h.add_quadratic(0, 1, 2.0).unwrap();
        let g = h.gradient(&[1.0, 2.0]).unwrap();
        // dE/dx0 = 1 + 2x0 + 2x1, dE/dx1 = 2x0
        assert_eq!(g, array![7.0, 2.0]);
    }

    #[test]
    fn test_to_polynomial_preserves_energy() {
        let mut h = Hamiltonian::new(3);
        h.add_linear(0, 0.5).unwrap();
        h.add_linear(2, -1.0).unwrap();
        h.add_quadratic(0, 2, 3.0).unwrap();
        h.add_quadratic(1, 1, 2.0).unwrap();
        let poly = h.to_polynomial();
        let x = [0.2, 1.5, 0.7];
        let a = h.energy(&x).unwrap();
        let b = poly.evaluate(&x).unwrap();
        assert!((a - b).abs() < 1e-12);
        assert_eq!(poly.max_degree(), 2);
        assert_eq!(poly.min_degree(), 1);
    }

    #[test]
    fn test_serde_without_quadratic() {
        let h: Hamiltonian = serde_json::from_str(r#"{"linear": [1.0, 2.0], "quadratic": []}"#).unwrap();
        assert_eq!(h.num_variables(), 2);
        assert_eq!(h.energy(&[1.0, 1.0]).unwrap(), 3.0);
    }
}
