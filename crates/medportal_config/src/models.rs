// --- File: crates/medportal_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

// --- Database Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String, // e.g. sqlite:data/medportal.db, loaded via PORTAL__DATABASE__URL
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:data/medportal.db".to_string(),
        }
    }
}

// --- Scheduling Config ---
/// Working window and slot grid used when offering appointment slots.
///
/// Times are clinic-local wall-clock values in `HH:MM` form, interpreted in
/// `time_zone`.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SchedulingConfig {
    pub work_start: String,
    pub work_end: String,
    pub slot_minutes: i64,
    /// Three-letter weekday names, e.g. `["Mon", "Tue"]`.
    pub working_days: Vec<String>,
    /// IANA zone name used to compute "now", e.g. `Europe/Zurich`.
    pub time_zone: String,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            work_start: "09:00".to_string(),
            work_end: "17:00".to_string(),
            slot_minutes: 30,
            working_days: ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]
                .iter()
                .map(|d| d.to_string())
                .collect(),
            time_zone: "UTC".to_string(),
        }
    }
}

// --- Auth Config ---
// The session service in front of the portal forwards caller identity headers
// and proves itself with this secret. Usually "secret_from_env" in files.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AuthConfig {
    pub shared_secret: Option<String>, // AUTH_SHARED_SECRET when marked secret_from_env
    /// Accept identity headers without a secret. Only for deployments where
    /// nothing but the session service can reach the portal.
    #[serde(default)]
    pub trust_identity_headers: bool,
}

// --- Logging Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub scheduling: SchedulingConfig,
    #[serde(default)]
    pub auth: Option<AuthConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}
