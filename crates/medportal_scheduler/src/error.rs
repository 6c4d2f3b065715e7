// --- File: crates/medportal_scheduler/src/error.rs ---
use axum::response::{IntoResponse, Response};
use medportal_common::PortalError;
use medportal_db::DbError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthenticated(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Temporal(String),
    #[error("Invalid scheduling configuration: {0}")]
    Config(String),
    #[error("Storage error: {0}")]
    Storage(#[from] DbError),
}

impl SchedulerError {
    pub fn validation(message: impl Into<String>) -> Self {
        SchedulerError::Validation(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        SchedulerError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        SchedulerError::NotFound(message.into())
    }
}

impl From<SchedulerError> for PortalError {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::Validation(m) => PortalError::ValidationError(m),
            SchedulerError::Unauthenticated(m) => PortalError::AuthError(m),
            SchedulerError::Forbidden(m) => PortalError::ForbiddenError(m),
            SchedulerError::NotFound(m) => PortalError::NotFoundError(m),
            SchedulerError::Temporal(m) => PortalError::TemporalError(m),
            SchedulerError::Config(m) => PortalError::ConfigError(m),
            SchedulerError::Storage(e) => PortalError::DatabaseError(e.to_string()),
        }
    }
}

impl IntoResponse for SchedulerError {
    fn into_response(self) -> Response {
        if let SchedulerError::Storage(ref e) = self {
            tracing::error!("Request failed on storage: {}", e);
        }
        PortalError::from(self).into_response()
    }
}
