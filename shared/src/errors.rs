//! Cross-cutting error type shared by the runtime crates.

use thiserror::Error;

/// Result alias for functions that can only fail with a [`SharedError`].
pub type SharedResult<T> = Result<T, SharedError>;

/// Errors that originate in ambient concerns (time, logging setup) rather
/// than in any one actor component.
#[derive(Error, Debug)]
pub enum SharedError {
    #[error("invalid time precision: {0}")]
    InvalidTimePrecision(String),

    #[error("logging initialization error: {0}")]
    LoggingInit(String),
}
