//! Menu domain error types.
//!
//! Validation and not-found outcomes are kept apart from storage failures
//! so callers can map each to its own response status.

use thiserror::Error;

/// Errors returned by menu operations.
#[derive(Debug, Error)]
pub enum MenuError {
    /// Input failed validation (missing field, bad reference, bad level).
    #[error("{0}")]
    Validation(String),

    /// The named entity does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The storage backend failed.
    #[error("storage error")]
    Storage(#[from] anyhow::Error),
}

impl MenuError {
    /// Shorthand for a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<sqlx::Error> for MenuError {
    fn from(e: sqlx::Error) -> Self {
        Self::Storage(e.into())
    }
}

/// Result type alias using MenuError.
pub type MenuResult<T> = Result<T, MenuError>;
