//! optiq adapter for the QCi hosted optimization service.
//!
//! Binary QUBOs run on **dirac-1**; continuous and integer qudit
//! Hamiltonians run on **dirac-3**. Problems are uploaded as files and
//! referenced by jobs:
//!
//! | Job type | Device | File | Settings |
//! |----------|--------|------|----------|
//! | `sample-qubo` | dirac-1 | `qubo` | `num_samples` |
//! | `sample-hamiltonian` | dirac-3 | `polynomial` | `sum_constraint`, `relaxation_schedule`, `solution_precision` |
//! | `sample-hamiltonian-integer` | dirac-3 | `polynomial` | `num_levels`, `relaxation_schedule` |
//!
//! # Authentication
//!
//! ```bash
//! export QCI_TOKEN="your-refresh-token"
//! export QCI_API_URL="https://api.qci-prod.com"  # optional, this is the default
//! ```
//!
//! # Example
//!
//! ```ignore
//! use optiq_adapter_qci::QciSolver;
//! use optiq_hal::{JobConfig, Problem, Solver};
//!
//! let solver = QciSolver::new()?;
//! let problem = Problem::Qubo(qubo);
//! let job = solver.submit(&problem, &JobConfig::for_problem(&problem, 20)).await?;
//! let result = solver.wait(&job).await?;
//! println!("best energy: {:?}", result.best_energy());
//! ```

pub mod api;
mod backend;
mod error;
pub mod files;

pub use api::QciClient;
pub use backend::{DEFAULT_BASE_URL, QciSolver};
pub use error::{QciError, QciResult};

pub use optiq_hal::{Solver, SolverConfig, SolverFactory};
