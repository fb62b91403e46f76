//! The error taxonomy shared by every component of the engine.
//!
//! Each variant corresponds to one category from the error handling design:
//! callers that need an HTTP status code map variants themselves (400 for
//! [`EngineError::Validation`], 404 for [`EngineError::NotFound`], 409 for
//! [`EngineError::State`] and [`EngineError::Conflict`], 422 for
//! [`EngineError::Pairing`]) — this crate has no transport layer of its own.

use thiserror::Error;

/// All errors the engine can return.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// Malformed input: missing id, invalid round number, unknown result code.
    #[error("validation error: {0}")]
    Validation(String),

    /// The requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// An illegal state transition was attempted.
    #[error("state error: {0}")]
    State(String),

    /// The pairing engine could not produce a legal pairing after every
    /// relaxation in §4.3.1 was exhausted.
    #[error("pairing error: {0}")]
    Pairing(String),

    /// Concurrent modification, or a result was already recorded with a
    /// divergent payload.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A downstream system (rating lookup, webhook, federation bridge) failed.
    #[error("integration error: {0}")]
    Integration(String),

    /// The operation exceeded its configured wall-clock budget.
    #[error("timeout: {0}")]
    Timeout(String),
}

impl EngineError {
    /// Shorthand for [`EngineError::NotFound`].
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Shorthand for [`EngineError::Validation`].
    pub fn validation(what: impl Into<String>) -> Self {
        Self::Validation(what.into())
    }

    /// Shorthand for [`EngineError::State`].
    pub fn state(what: impl Into<String>) -> Self {
        Self::State(what.into())
    }

    /// Shorthand for [`EngineError::Conflict`].
    pub fn conflict(what: impl Into<String>) -> Self {
        Self::Conflict(what.into())
    }
}

/// The result type used throughout the engine.
pub type EngineResult<T> = Result<T, EngineError>;
