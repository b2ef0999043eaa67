//! `optiq-hal`: the solver abstraction layer.
//!
//! Every sampler, local or hosted, implements [`Solver`]. A job moves
//! through the same lifecycle everywhere:
//!
//! ```text
//!   validate() ──→ submit() ──→ status() ... ──→ result()
//! ```
//!
//! # Example
//!
//! ```ignore
//! use optiq_hal::{JobConfig, Problem, Solver};
//!
//! let problem = Problem::Qubo(qubo);
//! let config = JobConfig::for_problem(&problem, 20);
//! let job = solver.submit(&problem, &config).await?;
//! let result = solver.wait(&job).await?;
//! println!("best energy: {:?}", result.best_energy());
//! ```

pub mod auth;
pub mod capability;
pub mod error;
pub mod job;
pub mod problem;
pub mod registry;
pub mod result;
pub mod solver;

pub use auth::{CachedToken, EnvTokenProvider, StaticTokenProvider, TokenProvider};
pub use capability::{Capabilities, VariableDomain};
pub use error::{HalError, HalResult};
pub use job::{Job, JobId, JobStatus, evict_jobs};
pub use problem::{DeviceKind, JobConfig, JobType, Problem};
pub use registry::SolverRegistry;
pub use result::SolveResult;
pub use solver::{
    Solver, SolverAvailability, SolverConfig, SolverFactory, ValidationResult, WaitOptions,
    check_against,
};
