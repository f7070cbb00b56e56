//! Error types for the static analysis core

use thiserror::Error;

/// Main error type for FEA operations
#[derive(Error, Debug)]
pub enum FEAError {
    #[error("Node with index {0} not found in model")]
    NodeNotFound(usize),

    #[error("Element '{0}' not found in model")]
    ElementNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Zero pivot {pivot:e} while condensing local DOF {dof}")]
    SingularPivot { dof: usize, pivot: f64 },

    #[error("Model not assembled - {0} is not available until assembly runs")]
    NotAssembled(&'static str),

    #[error("Model not solved - run solve_linear() first")]
    NotSolved,

    #[error("Convergence failed after {iterations} iterations (residual {residual:e})")]
    ConvergenceFailed { iterations: usize, residual: f64 },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Result type for FEA operations
pub type FEAResult<T> = Result<T, FEAError>;
