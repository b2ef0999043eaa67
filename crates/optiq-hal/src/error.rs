//! Error types for the HAL crate.

use thiserror::Error;

/// Errors that can occur in solver operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HalError {
    /// Solver is not available.
    #[error("Solver not available: {0}")]
    SolverUnavailable(String),

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Job execution failed.
    #[error("Job failed: {0}")]
    JobFailed(String),

    /// Job was cancelled.
    #[error("Job cancelled")]
    JobCancelled,

    /// Job not found.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Problem rejected before submission.
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    /// Job configuration rejected before submission.
    #[error("Invalid job configuration: {0}")]
    InvalidConfig(String),

    /// Encoding or sample interpretation error.
    #[error("Model error: {0}")]
    Model(#[from] optiq_model::ModelError),

    /// Network error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Timeout waiting for job.
    #[error("Timeout waiting for job {0}")]
    Timeout(String),

    /// Generic solver error.
    #[error("Solver error: {0}")]
    Backend(String),
}

/// Result type for HAL operations.
pub type HalResult<T> = Result<T, HalError>;
