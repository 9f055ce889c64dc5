use thiserror::Error;

use crate::db_types::Cents;

/// The error taxonomy shared by every engine API and backend trait.
///
/// Backends translate their own failures into one of these variants; the server maps each variant onto an HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Not authorized: {0}")]
    Authorization(String),
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error("Insufficient balance. The order costs {required}, but only {available} is available")]
    InsufficientBalance { required: Cents, available: Cents },
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Too many requests: {0}")]
    RateLimited(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl EngineError {
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found<S: Into<String>>(what: S) -> Self {
        Self::NotFound(what.into())
    }

    pub fn unauthorized<S: Into<String>>(msg: S) -> Self {
        Self::Authorization(msg.into())
    }

    pub fn conflict<S: Into<String>>(msg: S) -> Self {
        Self::Conflict(msg.into())
    }
}
