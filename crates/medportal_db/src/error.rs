//! Error types for the database client

use thiserror::Error;

/// Errors that can occur when working with the database client
#[derive(Debug, Error)]
pub enum DbError {
    /// Error from SQLx
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    /// Error with the database configuration
    #[error("Database configuration error: {0}")]
    ConfigError(String),

    /// Error with database URL parsing
    #[error("Database URL error: {0}")]
    UrlError(String),

    /// Error with database pool creation
    #[error("Database pool error: {0}")]
    PoolError(String),

    /// Error with database query
    #[error("Database query error: {0}")]
    QueryError(String),

    /// Error with database transaction
    #[error("Database transaction error: {0}")]
    TransactionError(String),

    /// A uniqueness constraint rejected the write
    #[error("Database conflict: {0}")]
    Conflict(String),

    /// A stored value could not be decoded
    #[error("Database decode error: {0}")]
    DecodeError(String),
}

impl DbError {
    /// Classifies a failed write: unique violations become [`DbError::Conflict`].
    pub fn from_write(err: sqlx::Error) -> Self {
        if is_unique_violation(&err) {
            DbError::Conflict(err.to_string())
        } else {
            DbError::QueryError(err.to_string())
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, DbError::Conflict(_))
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            // The Any driver does not always surface the error kind
            db_err.is_unique_violation()
                || db_err.message().contains("UNIQUE constraint failed")
                || db_err.message().contains("duplicate key")
        }
        _ => false,
    }
}
