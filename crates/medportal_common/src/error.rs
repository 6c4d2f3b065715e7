// --- File: crates/medportal_common/src/error.rs ---
use std::fmt;
use thiserror::Error;

/// The base error type surfaced to portal callers.
///
/// Each crate keeps its own error enum and converts into `PortalError` at the
/// HTTP boundary.
#[derive(Error, Debug)]
pub enum PortalError {
    /// Missing or malformed input; nothing was persisted
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// No authenticated caller
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Authenticated caller acting outside their role or on someone else's data
    #[error("Forbidden: {0}")]
    ForbiddenError(String),

    /// Resource does not exist
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Action not allowed at this point in time (e.g. cancelling the past)
    #[error("Temporal error: {0}")]
    TemporalError(String),

    /// Error occurred during database operation
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl PortalError {
    /// The human-readable message without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            PortalError::ValidationError(m)
            | PortalError::AuthError(m)
            | PortalError::ForbiddenError(m)
            | PortalError::NotFoundError(m)
            | PortalError::TemporalError(m)
            | PortalError::DatabaseError(m)
            | PortalError::ConfigError(m)
            | PortalError::InternalError(m) => m,
        }
    }
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for PortalError {
    fn status_code(&self) -> u16 {
        match self {
            PortalError::ValidationError(_) => 400,
            PortalError::AuthError(_) => 401,
            PortalError::ForbiddenError(_) => 403,
            PortalError::NotFoundError(_) => 404,
            PortalError::TemporalError(_) => 422,
            PortalError::DatabaseError(_) => 500,
            PortalError::ConfigError(_) => 500,
            PortalError::InternalError(_) => 500,
        }
    }
}

// Utility functions for error handling
pub fn internal_error<T: fmt::Display>(message: T) -> PortalError {
    PortalError::InternalError(message.to_string())
}
