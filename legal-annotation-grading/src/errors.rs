//! Error types for the grading harness.
//!
//! Only loading and configuration can fail. Grading itself never errors:
//! differences are reported as failed facets.

use thiserror::Error;

/// Errors that can occur while loading annotations, cases or configuration.
#[derive(Debug, Error)]
pub enum GradeError {
    /// The annotation script is not valid RON for the step format.
    #[error("parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    /// A step refers to an id that is unknown, duplicated or of the wrong kind.
    #[error("step {step}: {message}")]
    Build { step: usize, message: String },

    /// Reading a script or case from disk failed.
    #[error("failed to load {path}: {message}")]
    Load { path: String, message: String },

    /// A grading config or expected-failures file is malformed.
    #[error("invalid configuration {path}: {message}")]
    Config { path: String, message: String },
}

/// Result type for grading operations.
pub type GradeResult<T> = Result<T, GradeError>;
