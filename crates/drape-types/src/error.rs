//! Error types for the drape solver.
//!
//! All crates return `DrapeResult<T>` from fallible operations. Numerical
//! trouble inside a step (PCG misses, line-search stalls) is never an error;
//! it is recovered locally and surfaced through step reports and diagnostics.

use thiserror::Error;

/// Unified error type for the drape solver.
#[derive(Debug, Error)]
pub enum DrapeError {
    /// Mesh data is malformed or inconsistent.
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    /// Material parameter is out of valid range.
    #[error("Invalid material parameter: {0}")]
    InvalidMaterial(String),

    /// Configuration value is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A pin or wall is malformed or references a vertex outside the mesh.
    #[error("Invalid constraint: {0}")]
    InvalidConstraint(String),

    /// A simulation state was stepped or queried before being initialised.
    #[error("Simulation state is not initialized")]
    StateNotInitialized,

    /// A direct linear solve failed (factorization or dimension mismatch).
    #[error("Linear solve failed: {0}")]
    LinearSolve(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A simulation invariant was violated.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

/// Convenience alias for `Result<T, DrapeError>`.
pub type DrapeResult<T> = Result<T, DrapeError>;
