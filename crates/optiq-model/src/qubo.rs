//! Quadratic Unconstrained Binary Optimization.
//!
//! A QUBO is stored as a dense symmetric matrix `Q` and a constant offset:
//!
//!   E(x) = xᵀ Q x + offset,   x ∈ {0, 1}ⁿ
//!
//! Because `xᵢ² = xᵢ` for binary variables, linear terms live on the
//! diagonal. Off-diagonal couplings are split evenly between `(i, j)` and
//! `(j, i)` so the matrix stays symmetric.
//!
//! # Example
//!
//! ```rust
//! use optiq_model::Qubo;
//!
//! // E(x) = -x₀ - x₁ + 2·x₀x₁
//! let mut q = Qubo::new(2);
//! q.add_linear(0, -1.0).unwrap();
//! q.add_linear(1, -1.0).unwrap();
//! q.add_quadratic(0, 1, 2.0).unwrap();
//!
//! assert_eq!(q.energy(&[1.0, 0.0]).unwrap(), -1.0);
//! assert_eq!(q.energy(&[1.0, 1.0]).unwrap(), 0.0);
//! ```

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::dense::{array_to_rows, ensure_finite, ensure_square, rows_to_array, symmetrize};
use crate::error::{ModelError, ModelResult};

/// A dense, symmetric QUBO with a constant offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "QuboRepr", into = "QuboRepr")]
pub struct Qubo {
    matrix: Array2<f64>,
    offset: f64,
}

impl Qubo {
    /// Create an all-zero QUBO over `n` variables.
    pub fn new(n: usize) -> Self {
        Self {
            matrix: Array2::zeros((n, n)),
            offset: 0.0,
        }
    }

    /// Build a QUBO from an arbitrary square matrix.
    ///
    /// The matrix is symmetrized as `(M + Mᵀ) / 2`, which leaves the
    /// energy of every binary vector unchanged.
    pub fn from_matrix(matrix: Array2<f64>) -> ModelResult<Self> {
        ensure_square(&matrix)?;
        ensure_finite(matrix.iter(), "QUBO matrix")?;
        Ok(Self {
            matrix: symmetrize(&matrix),
            offset: 0.0,
        })
    }

    /// Build a QUBO from `(i, j, value)` terms.
    ///
    /// Terms with `i == j` are linear; the rest are couplings. Repeated
    /// pairs accumulate.
    pub fn from_terms(
        n: usize,
        terms: impl IntoIterator<Item = (usize, usize, f64)>,
    ) -> ModelResult<Self> {
        let mut qubo = Self::new(n);
        for (i, j, v) in terms {
            qubo.add_quadratic(i, j, v)?;
        }
        Ok(qubo)
    }

    /// Set the constant offset.
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    /// Number of binary variables.
    pub fn num_variables(&self) -> usize {
        self.matrix.nrows()
    }

    /// The symmetric coefficient matrix.
    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    /// The constant offset.
    pub fn offset(&self) -> f64 {
        self.offset
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
        self.matrix[[i, i]] += value;
        Ok(())
    }

    /// Add `value · xᵢ xⱼ`.
    pub fn add_quadratic(&mut self, i: usize, j: usize, value: f64) -> ModelResult<()> {
        self.check_index(i)?;
        self.check_index(j)?;
        if i == j {
            self.matrix[[i, i]] += value;
        } else {
            let half = value / 2.0;
            self.matrix[[i, j]] += half;
            self.matrix[[j, i]] += half;
        }
        Ok(())
    }

    /// Add a constant to the energy.
    pub fn add_offset(&mut self, value: f64) {
        self.offset += value;
    }

    /// Multiply every coefficient and the offset by `factor`.
    pub fn scale(&mut self, factor: f64) {
        self.matrix *= factor;
        self.offset *= factor;
    }

    /// Energy of an assignment: `xᵀQx + offset`.
    ///
    /// The values are used as given; pass 0/1 vectors for binary energies.
    pub fn energy(&self, x: &[f64]) -> ModelResult<f64> {
        if x.len() != self.num_variables() {
            return Err(ModelError::DimensionMismatch {
                expected: self.num_variables(),
                actual: x.len(),
            });
        }
        let x = ArrayView1::from(x);
        Ok(x.dot(&self.matrix.dot(&x)) + self.offset)
    }

    /// Non-zero upper-triangular terms `(i, j, v)` with `i ≤ j`.
    ///
    /// Off-diagonal values are the full coupling `2·Q_ij`, so
    /// `Σ v·xᵢxⱼ` reproduces the energy without the offset.
    pub fn upper_triangular_terms(&self) -> Vec<(usize, usize, f64)> {
        let n = self.num_variables();
        let mut terms = Vec::new();
        for i in 0..n {
            for j in i..n {
                let v = if i == j {
                    self.matrix[[i, i]]
                } else {
                    2.0 * self.matrix[[i, j]]
                };
                if v != 0.0 {
                    terms.push((i, j, v));
                }
            }
        }
        terms
    }

    /// Largest absolute coefficient, 0 for an empty QUBO.
    pub fn max_abs_coefficient(&self) -> f64 {
        self.matrix.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }

    /// Check `Q == Qᵀ` within `tol`.
    pub fn is_symmetric(&self, tol: f64) -> bool {
        let n = self.num_variables();
        (0..n).all(|i| (i + 1..n).all(|j| (self.matrix[[i, j]] - self.matrix[[j, i]]).abs() <= tol))
    }
}

/// On-disk form: nested rows plus offset.
#[derive(Serialize, Deserialize)]
struct QuboRepr {
    matrix: Vec<Vec<f64>>,
    #[serde(default)]
    offset: f64,
}

impl TryFrom<QuboRepr> for Qubo {
    type Error = ModelError;

    fn try_from(repr: QuboRepr) -> ModelResult<Self> {
        let matrix = rows_to_array(&repr.matrix)?;
        Ok(Qubo::from_matrix(matrix)?.with_offset(repr.offset))
    }
}

impl From<Qubo> for QuboRepr {
    fn from(qubo: Qubo) -> Self {
        Self {
            matrix: array_to_rows(&qubo.matrix),
            offset: qubo.offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_new_is_zero() {
        let q = Qubo::new(3);
        assert_eq!(q.num_variables(), 3);
        assert_eq!(q.energy(&[1.0, 1.0, 1.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_from_matrix_symmetrizes() {
        let q = Qubo::from_matrix(array![[1.0, 3.0], [1.0, -2.0]]).unwrap();
        assert_eq!(q.matrix()[[0, 1]], 2.0);
        assert_eq!(q.matrix()[[1, 0]], 2.0);
        assert!(q.is_symmetric(0.0));
        // x = (1, 1): 1 + 3 + 1 - 2
        assert_eq!(q.energy(&[1.0, 1.0]).unwrap(), 3.0);
    }

    #[test]
    fn test_from_matrix_not_square() {
        let err = Qubo::from_matrix(Array2::zeros((2, 3))).unwrap_err();
        assert!(matches!(err, ModelError::NotSquare { rows: 2, cols: 3 }));
    }

    #[test]
    fn test_quadratic_splits_coupling() {
        let mut q = Qubo::new(2);
        q.add_quadratic(0, 1, 4.0).unwrap();
        assert_eq!(q.matrix()[[0, 1]], 2.0);
        assert_eq!(q.matrix()[[1, 0]], 2.0);
        assert_eq!(q.energy(&[1.0, 1.0]).unwrap(), 4.0);
    }

    #[test]
    fn test_out_of_range_index() {
        let mut q = Qubo::new(2);
        assert!(matches!(
            q.add_linear(2, 1.0),
            Err(ModelError::VariableOutOfRange { index: 2, num_variables: 2 })
        ));
    }

    #[test]
    fn test_energy_length_mismatch() {
        let q = Qubo::new(2);
        assert!(q.energy(&[1.0]).is_err());
    }

    #[test]
    fn test_offset_and_scale() {
        let mut q = Qubo::new(1);
        q.add_linear(0, 2.0).unwrap();
        q.add_offset(1.0);
        q.scale(3.0);
        assert_eq!(q.energy(&[0.0]).unwrap(), 3.0);
        assert_eq!(q.energy(&[1.0]).unwrap(), 9.0);
    }

    #[test]
    fn test_upper_triangular_terms() {
        let q = Qubo::from_terms(3, [(0, 0, -1.0), (0, 2, 3.0), (2, 0, 1.0)]).unwrap();
        let terms = q.upper_triangular_terms();
        assert_eq!(terms, vec![(0, 0, -1.0), (0, 2, 4.0)]);
    }

    #[test]
    fn test_serde_roundtrip_keeps_offset() {
        let q = Qubo::from_terms(2, [(0, 1, 1.0)]).unwrap().with_offset(5.0);
        let json = serde_json::to_string(&q).unwrap();
        let back: Qubo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, q);
    }

    #[test]
    fn test_deserialize_rejects_non_square() {
        let json = r#"{"matrix": [[1.0, 2.0]], "offset": 0.0}"#;
        assert!(serde_json::from_str::<Qubo>(json).is_err());
    }
}
