//! optiq local sampler
//!
//! A solver that runs entirely in-process, for development, tests and
//! small instances. It implements the same [`Solver`](optiq_hal::Solver)
//! lifecycle as the hosted backend so code can switch between them.
//!
//! | Job type | Method |
//! |----------|--------|
//! | binary QUBO, ≤ 20 variables | exhaustive Gray-code enumeration |
//! | binary QUBO, larger | simulated annealing with local fields |
//! | continuous qudit | pairwise-transfer search on `Σx = R` |
//! | integer qudit | annealing over levels |
//!
//! The relaxation schedule maps to the number of annealing sweeps; a
//! `seed` in the job config makes runs reproducible.
//!
//! # Example
//!
//! ```rust
//! use optiq_adapter_sim::SimSolver;
//! use optiq_hal::{JobConfig, Problem, Solver};
//! use optiq_model::{Penalty, set_partition::instances};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let partition = instances::disjoint()?;
//! let problem = Problem::from(partition.to_qubo(Penalty::Auto)?);
//! let config = JobConfig::for_problem(&problem, 10);
//!
//! let solver = SimSolver::new();
//! let job_id = solver.submit(&problem, &config).await?;
//! let result = solver.wait(&job_id).await?;
//! assert_eq!(result.best_energy(), Some(2.5));
//! # Ok(())
//! # }
//! ```

pub mod binary;
pub mod qudit;
mod solver;

pub use solver::{SimSolver, sweeps_for_schedule};
