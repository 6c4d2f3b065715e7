// --- File: crates/services/medportal_backend/src/app_state.rs ---
use medportal_common::{internal_error, PortalError};
use medportal_config::AppConfig;
use medportal_db::{DbClient, DbClientFactory};
use medportal_scheduler::{BroadcastRelay, SchedulerState};
use std::sync::Arc;
use tracing::info;

/// Application state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db_client: DbClient,
    pub scheduler: SchedulerState,
}

impl AppState {
    /// Connect to storage, create the schema and wire the scheduler.
    pub async fn new(config: Arc<AppConfig>) -> Result<Self, PortalError> {
        let db_client = DbClientFactory::new()
            .from_app_config(&config)
            .await
            .map_err(|e| PortalError::DatabaseError(e.to_string()))?;

        let relay = Arc::new(BroadcastRelay::default());
        let scheduler = SchedulerState::from_config(&config, db_client.clone(), relay)
            .map_err(PortalError::from)?;
        scheduler
            .scheduler
            .init_storage()
            .await
            .map_err(|e| internal_error(format!("schema initialization failed: {e}")))?;
        info!("Scheduler ready, storage: {}", db_client);

        Ok(Self {
            config,
            db_client,
            scheduler,
        })
    }
}
