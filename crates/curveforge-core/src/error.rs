//! Error types for core date and tenor operations.

use thiserror::Error;

/// A specialized Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors from date, tenor and convention handling.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Error in date calculations or invalid date.
    #[error("Invalid date: {message}")]
    InvalidDate {
        /// Description of the date error.
        message: String,
    },

    /// A tenor string could not be parsed.
    #[error("Invalid tenor: {input}")]
    InvalidTenor {
        /// The offending input.
        input: String,
    },
}

impl CoreError {
    /// Creates an `InvalidDate` error.
    pub fn invalid_date(message: impl Into<String>) -> Self {
        CoreError::InvalidDate {
            message: message.into(),
        }
    }

    /// Creates an `InvalidTenor` error.
    pub fn invalid_tenor(input: impl Into<String>) -> Self {
        CoreError::InvalidTenor {
            input: input.into(),
        }
    }
}
