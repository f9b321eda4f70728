// src/error.rs

use thiserror::Error;

/// Global Application Error Enum.
/// Centralizes the hard failures the catalog, engine and storage can raise.
///
/// Lookups that miss and operations without an active session are not errors:
/// they surface as `None` / `false` at the call site.
#[derive(Debug, Error)]
pub enum AppError {
    /// A published quiz was targeted by an edit or delete.
    /// Indicates a caller bug, not a user condition.
    #[error("immutable quiz: {0}")]
    Immutable(String),

    /// Input rejected by field-level validation rules.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The persistence backend failed to read or write.
    #[error("storage error: {0}")]
    Storage(String),

    /// A document could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Converts `std::io::Error` into `AppError::Storage`.
/// Allows using `?` on file-backed storage calls.
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
