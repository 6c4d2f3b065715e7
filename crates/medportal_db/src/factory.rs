//! Factory for creating database clients

use crate::client::DbClient;
use crate::error::DbError;
use medportal_config::AppConfig;
use tracing::debug;

/// Factory for creating database clients from the application configuration.
#[derive(Debug, Clone, Default)]
pub struct DbClientFactory;

impl DbClientFactory {
    pub fn new() -> Self {
        Self
    }

    /// Create a client from the application configuration.
    pub async fn from_app_config(&self, config: &AppConfig) -> Result<DbClient, DbError> {
        debug!("Creating database client from application configuration");
        DbClient::new(config).await
    }
}
