//! `optiq-model`: problem encoders and sample interpretation.
//!
//! This crate turns structured problem descriptions into the dense numeric
//! forms accepted by hosted optimization services, and checks what comes
//! back:
//!
//! - [`Qubo`] binary quadratic objective `xᵀQx + offset`
//! - [`Hamiltonian`] continuous/integer qudit objective in `[C | J]` form
//! - [`Polynomial`] sparse higher-order objective (padded wire indices)
//! - [`SetPartition`] exact-cover instance with a penalty QUBO encoding
//! - [`SampleSet`] solver samples, energies and counts
//! - [`interpret`] feasibility and energy checks over a sample set
//!
//! # Quick start
//!
//! ```rust
//! use optiq_model::{Penalty, SampleSet, Sample, interpret};
//! use optiq_model::set_partition::instances;
//!
//! let problem = instances::disjoint().unwrap();
//! let qubo = problem.to_qubo(Penalty::Auto).unwrap();
//!
//! let x = vec![0.0, 0.0, 0.0, 1.0];
//! let energy = qubo.energy(&x).unwrap();
//! let samples = SampleSet::new(vec![Sample::new(x, energy)]);
//!
//! let summary = interpret::interpret_partition(&problem, &samples).unwrap();
//! assert_eq!(summary.best().unwrap().report.cost, 2.5);
//! ```

mod dense;
pub mod error;
pub mod hamiltonian;
pub mod interpret;
pub mod objective;
pub mod polynomial;
pub mod qubo;
pub mod sample;
pub mod set_partition;

pub use error::{ModelError, ModelResult};
pub use hamiltonian::Hamiltonian;
pub use objective::Objective;
pub use polynomial::Polynomial;
pub use qubo::Qubo;
pub use sample::{Sample, SampleSet};
pub use set_partition::{PartitionReport, Penalty, SetPartition};
