//! Error types for mathematical operations.

use thiserror::Error;

/// A specialized Result type for mathematical operations.
pub type MathResult<T> = Result<T, MathError>;

/// Errors that can occur during mathematical operations.
#[derive(Error, Debug, Clone)]
pub enum MathError {
    /// Root-finding algorithm failed to converge.
    #[error("Convergence failed after {iterations} iterations (residual norm: {residual:.2e})")]
    ConvergenceFailed {
        /// Number of iterations attempted.
        iterations: u32,
        /// Final residual norm.
        residual: f64,
    },

    /// Matrix is singular (not invertible).
    #[error("Singular matrix: cannot invert ({rows}x{cols})")]
    SingularMatrix {
        /// Row count of the offending matrix.
        rows: usize,
        /// Column count of the offending matrix.
        cols: usize,
    },

    /// Matrix or vector dimensions are incompatible.
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        got: usize,
    },

    /// Not enough points for interpolation.
    #[error("Insufficient points: need at least {required}, got {got}")]
    InsufficientPoints {
        /// Minimum required points.
        required: usize,
        /// Actual number of points.
        got: usize,
    },

    /// Abscissae are not strictly increasing.
    #[error("Non-monotonic abscissae at index {index}: {prev} >= {current}")]
    NonMonotonicAbscissae {
        /// Index where monotonicity breaks.
        index: usize,
        /// Previous abscissa.
        prev: f64,
        /// Current abscissa.
        current: f64,
    },

    /// Log-linear interpolation requires strictly positive ordinates.
    #[error("Non-positive ordinate {value} at index {index} for log-linear interpolation")]
    NonPositiveOrdinate {
        /// Offending index.
        index: usize,
        /// Offending value.
        value: f64,
    },
}

impl MathError {
    /// Creates a `ConvergenceFailed` error.
    #[must_use]
    pub fn convergence_failed(iterations: u32, residual: f64) -> Self {
        MathError::ConvergenceFailed {
            iterations,
            residual,
        }
    }
}
