//! A common view over everything that can score an assignment.

use crate::error::ModelResult;
use crate::hamiltonian::Hamiltonian;
use crate::polynomial::Polynomial;
use crate::qubo::Qubo;

/// An objective function over a fixed number of variables.
pub trait Objective {
    /// Number of variables the objective expects.
    fn num_variables(&self) -> usize;

    /// Value of the objective at `x`.
    fn evaluate(&self, x: &[f64]) -> ModelResult<f64>;
}

impl Objective for Qubo {
    fn num_variables(&self) -> usize {
        Qubo::num_variables(self)
    }

    fn evaluate(&self, x: &[f64]) -> ModelResult<f64> {
        self.energy(x)
    }
}

impl Objective for Hamiltonian {
    fn num_variables(&self) -> usize {
        Hamiltonian::num_variables(self)
    }

    fn evaluate(&self, x: &[f64]) -> ModelResult<f64> {
        self.energy(x)
    }
}

impl Objective for Polynomial {
    fn num_variables(&self) -> usize {
        Polynomial::num_variables(self)
    }

    fn evaluate(&self, x: &[f64]) -> ModelResult<f64> {
        Polynomial::evaluate(self, x)
    }
}
