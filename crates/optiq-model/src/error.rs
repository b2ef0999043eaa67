//! Error types for the model crate.

use thiserror::Error;

/// Errors produced while encoding problems or interpreting samples.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// A coefficient matrix that must be square is not.
    #[error("Matrix must be square, got {rows}x{cols}")]
    NotSquare {
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        cols: usize,
    },

    /// Two parts of a problem disagree on their dimension.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// A variable index is outside the problem.
    #[error("Variable index {index} out of range for {num_variables} variables")]
    VariableOutOfRange {
        /// The offending index.
        index: usize,
        /// Number of variables in the problem.
        num_variables: usize,
    },

    /// A set-partitioning subset references an element outside the universe.
    #[error("Subset {subset} contains element {element} but the universe has {num_elements}")]
    ElementOutOfRange {
        /// Index of the subset.
        subset: usize,
        /// The offending element.
        element: usize,
        /// Size of the universe.
        num_elements: usize,
    },

    /// A set-partitioning subset is empty.
    #[error("Subset {0} is empty")]
    EmptySubset(usize),

    /// A sample value that should be binary is not.
    #[error("Sample value {value} at position {index} is not binary")]
    NonBinaryValue {
        /// Position in the sample vector.
        index: usize,
        /// The offending value.
        value: f64,
    },

    /// A coefficient or value is NaN or infinite.
    #[error("Non-finite value: {0}")]
    NonFinite(String),

    /// A solver response could not be interpreted.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Invalid problem definition.
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),
}

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;
