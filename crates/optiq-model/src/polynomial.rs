//! Sparse polynomials over bounded variables.
//!
//! Higher-order objectives are exchanged as a list of monomials. On the wire
//! every monomial is written as a list of **1-based** variable indices,
//! left-padded with `0` up to the polynomial's maximum degree and sorted
//! non-decreasing, e.g. for `max_degree = 3`:
//!
//! | Monomial | Padded indices |
//! |----------|----------------|
//! | `x₀` | `[0, 0, 1]` |
//! | `x₀ x₂` | `[0, 1, 3]` |
//! | `x₁²` | `[0, 2, 2]` |
//! | `x₀ x₁ x₁` | `[1, 2, 2]` |
//!
//! Internally monomials are keyed by sorted 0-based indices. Constants are
//! kept apart because the padded form cannot express them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dense::ensure_finite;
use crate::error::{ModelError, ModelResult};
use crate::qubo::Qubo;

/// A sparse polynomial `constant + Σ coeff · Π x_k`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PolynomialRepr", into = "PolynomialRepr")]
pub struct Polynomial {
    num_variables: usize,
    constant: f64,
    terms: BTreeMap<Vec<usize>, f64>,
}

impl Polynomial {
    /// Create an empty polynomial over `num_variables` variables.
    pub fn new(num_variables: usize) -> Self {
        Self {
            num_variables,
            constant: 0.0,
            terms: BTreeMap::new(),
        }
    }

    /// Number of variables.
    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    /// Constant term.
    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// Add `coeff · Π x_k` for the 0-based indices in `vars`.
    ///
    /// Repeated indices raise the power of that variable. An empty `vars`
    /// adds to the constant. Monomials that cancel to zero are dropped.
    pub fn add_term(&mut self, vars: &[usize], coeff: f64) -> ModelResult<()> {
        ensure_finite(&[coeff], "polynomial coefficient")?;
        if let Some(&index) = vars.iter().find(|&&v| v >= self.num_variables) {
            return Err(ModelError::VariableOutOfRange {
                index,
                num_variables: self.num_variables,
            });
        }
        let mut key = vars.to_vec();
        key.sort_unstable();
        self.insert(key, coeff);
        Ok(())
    }

    /// Insert a sorted, in-range monomial.
    pub(crate) fn insert(&mut self, key: Vec<usize>, coeff: f64) {
        if coeff == 0.0 {
            return;
        }
        if key.is_empty() {
            self.constant += coeff;
            return;
        }
        let entry = self.terms.entry(key.clone()).or_insert(0.0);
        *entry += coeff;
        if *entry == 0.0 {
            self.terms.remove(&key);
        }
    }

    /// Iterate over `(indices, coeff)` with sorted 0-based indices.
    pub fn terms(&self) -> impl Iterator<Item = (&[usize], f64)> {
        self.terms.iter().map(|(k, v)| (k.as_slice(), *v))
    }

    /// Number of non-constant monomials.
    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    /// Smallest monomial degree, 0 when there are no monomials.
    pub fn min_degree(&self) -> usize {
        self.terms.keys().map(Vec::len).min().unwrap_or(0)
    }

    /// Largest monomial degree, 0 when there are no monomials.
    pub fn max_degree(&self) -> usize {
        self.terms.keys().map(Vec::len).max().unwrap_or(0)
    }

    /// Monomials in the padded, 1-based wire form.
    pub fn padded_terms(&self) -> Vec<(Vec<usize>, f64)> {
        let degree = self.max_degree();
        self.terms
            .iter()
            .map(|(k, v)| {
                let mut idx = vec![0; degree - k.len()];
                idx.extend(k.iter().map(|i| i + 1));
                (idx, *v)
            })
            .collect()
    }

    /// Parse monomials in the padded, 1-based wire form.
    pub fn from_padded(
        num_variables: usize,
        terms: impl IntoIterator<Item = (Vec<usize>, f64)>,
    ) -> ModelResult<Self> {
        let mut poly = Self::new(num_variables);
        for (idx, coeff) in terms {
            let vars: Vec<usize> = idx.into_iter().filter(|&i| i != 0).map(|i| i - 1).collect();
            poly.add_term(&vars, coeff)?;
        }
        Ok(poly)
    }

    /// Evaluate at `x`.
    pub fn evaluate(&self, x: &[f64]) -> ModelResult<f64> {
        if x.len() != self.num_variables {
            return Err(ModelError::DimensionMismatch {
                expected: self.num_variables,
                actual: x.len(),
            });
        }
        let mut total = self.constant;
        for (k, c) in &self.terms {
            let mut product = *c;
            for &i in k {
                // Deserialized monomials are not range-checked up front.
                product *= *x.get(i).ok_or(ModelError::VariableOutOfRange {
                    index: i,
                    num_variables: self.num_variables,
                })?;
            }
            total += product;
        }
        Ok(total)
    }

    /// Convert a QUBO (`x² = x`, so diagonal entries become linear terms).
    pub fn from_qubo(qubo: &Qubo) -> Self {
        let mut poly = Self::new(qubo.num_variables());
        for (i, j, v) in qubo.upper_triangular_terms() {
            let key = if i == j { vec![i] } else { vec![i, j] };
            poly.insert(key, v);
        }
        poly.constant = qubo.offset();
        poly
    }

    /// Convert a QUBO for real-valued variables. Diagonal entries stay
    /// square terms `Q_ii x_i²`, so the result agrees with
    /// [`Qubo::energy`] at every point, not only on binary ones.
    pub fn from_qubo_continuous(qubo: &Qubo) -> Self {
        let mut poly = Self::new(qubo.num_variables());
        for (i, j, v) in qubo.upper_triangular_terms() {
            poly.insert(vec![i, j], v);
        }
        poly.constant = qubo.offset();
        poly
    }
}

/// On-disk form: monomials as a list of `{"idx": [...], "val": v}` with
/// 0-based indices.
#[derive(Serialize, Deserialize)]
struct PolynomialRepr {
    num_variables: usize,
    #[serde(default)]
    constant: f64,
    terms: Vec<Monomial>,
}

#[derive(Serialize, Deserialize)]
struct Monomial {
    idx: Vec<usize>,
    val: f64,
}

impl TryFrom<PolynomialRepr> for Polynomial {
    type Error = ModelError;

    fn try_from(repr: PolynomialRepr) -> ModelResult<Self> {
        let mut poly = Polynomial::new(repr.num_variables);
        poly.add_term(&[], repr.constant)?;
        for m in repr.terms {
            poly.add_term(&m.idx, m.val)?;
        }
        Ok(poly)
    }
}

impl From<Polynomial> for PolynomialRepr {
    fn from(p: Polynomial) -> Self {
        Self {
            num_variables: p.num_variables,
            constant: p.constant,
            terms: p
                .terms
                .into_iter()
                .map(|(idx, val)| Monomial { idx, val })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_merge() {
        let mut p = Polynomial::new(3);
        p.add_term(&[2, 0], 1.0).unwrap();
        p.add_term(&[0, 2], 2.0).unwrap();
        assert_eq!(p.num_terms(), 1);
        assert_eq!(p.terms().next(), Some((&[0usize, 2][..], 3.0)));
    }

    #[test]
    fn test_cancelled_term_removed() {
        let mut p = Polynomial::new(2);
        p.add_term(&[1], 1.5).unwrap();
        p.add_term(&[1], -1.5).unwrap();
        assert_eq!(p.num_terms(), 0);
        assert_eq!(p.max_degree(), 0);
    }

    #[test]
    fn test_out_of_range() {
        let mut p = Polynomial::new(2);
        assert!(matches!(
            p.add_term(&[0, 2], 1.0),
            Err(ModelError::VariableOutOfRange { index: 2, .. })
        ));
    }

    #[test]
    fn test_padded_terms() {
        let mut p = Polynomial::new(3);
        p.add_term(&[0], 1.0).unwrap();
        p.add_term(&[0, 2], 2.0).unwrap();
        p.add_term(&[1, 1, 0], 3.0).unwrap();
        let padded = p.padded_terms();
        assert!(padded.contains(&(vec![0, 0, 1], 1.0)));
        assert!(padded.contains(&(vec![0, 1, 3], 2.0)));
        assert!(padded.contains(&(vec![1, 2, 2], 3.0)));
    }

    #[test]
    fn test_from_padded_inverse() {
        let mut p = Polynomial::new(3);
        p.add_term(&[1], -2.0).unwrap();
        p.add_term(&[0, 2], 0.5).unwrap();
        let q = Polynomial::from_padded(3, p.padded_terms()).unwrap();
        assert_eq!(p, q);
    }

    #[test]
    fn test_evaluate_cubic() {
        let mut p = Polynomial::new(2);
        p.add_term(&[0, 0, 1], 2.0).unwrap();
        p.add_term(&[], 1.0).unwrap();
        // 1 + 2·3²·0.5
        assert_eq!(p.evaluate(&[3.0, 0.5]).unwrap(), 10.0);
    }

    #[test]
    fn test_from_qubo_binary_energy() {
        let q = Qubo::from_terms(2, [(0, 0, -1.0), (0, 1, 2.0)])
            .unwrap()
            .with_offset(0.5);
        let p = Polynomial::from_qubo(&q);
        for x in [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]] {
            assert_eq!(p.evaluate(&x).unwrap(), q.energy(&x).unwrap());
        }
    }

    #[test]
    fn test_from_qubo_continuous_keeps_squares() {
        let q = Qubo::from_terms(2, [(0, 0, 1.0), (0, 1, -2.0)]).unwrap();
        let p = Polynomial::from_qubo_continuous(&q);
        assert_eq!(p.max_degree(), 2);
        assert_eq!(p.min_degree(), 2);
        let x = [0.5, 0.25];
        assert!((p.evaluate(&x).unwrap() - q.energy(&x).unwrap()).abs() < 1e-12);
        assert!(p.padded_terms().contains(&(vec![1, 1], 1.0)));
    }

    #[test]
    fn test_deserialize_rejects_out_of_range_index() {
        let json = r#"{"num_variables": 1, "terms": [{"idx": [3], "val": 1.0}]}"#;
        let err = serde_json::from_str::<Polynomial>(json).unwrap_err();
        assert!(err.to_string().contains("out of range"), "{err}");
    }

    #[test]
    fn test_deserialize_drops_zero_and_merges() {
        let json = r#"{
            "num_variables": 2,
            "terms": [
                {"idx": [0, 0, 0], "val": 0.0},
                {"idx": [1, 0], "val": 1.0},
                {"idx": [0, 1], "val": 0.5}
            ]
        }"#;
        let p: Polynomial = serde_json::from_str(json).unwrap();
        assert_eq!(p.num_terms(), 1);
        assert_eq!(p.terms().next(), Some((&[0usize, 1][..], 1.5)));
        assert_eq!(p.constant(), 0.0);
    }

    #[test]
    fn test_serde_shape() {
        let mut p = Polynomial::new(2);
        p.add_term(&[0, 1], 1.0).unwrap();
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["terms"][0]["idx"], serde_json::json!([0, 1]));
        let back: Polynomial = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
    }
}
