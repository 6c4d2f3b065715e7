use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::env;
use std::path::Path;
use tracing::{debug, warn};
pub mod models;
pub use models::*;

/// Marker value that is replaced by an environment variable at load time.
pub const SECRET_FROM_ENV: &str = "secret_from_env";

/// Loads the configuration from `./config`.
///
/// Layering, later sources win:
/// 1. `config/default.{toml,yaml,json}` (optional)
/// 2. `config/{RUN_ENV}.*` (optional, `RUN_ENV` defaults to `debug`)
/// 3. environment variables prefixed with `PORTAL`, nested with `__`
///    (e.g. `PORTAL__SERVER__PORT=9000`)
///
/// Any string equal to `secret_from_env` is then resolved from the environment.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(Path::new("config"))
}

/// Same as [`load_config`] with an explicit configuration directory.
pub fn load_config_from(config_dir: &Path) -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    let prefix = env::var("PREFIX").unwrap_or_else(|_| "PORTAL".to_string());

    let default_path = config_dir.join("default");
    let env_path = config_dir.join(&run_env);

    debug!(
        "Loading configuration from {} and {}",
        default_path.display(),
        env_path.display()
    );

    let builder = Config::builder()
        .add_source(File::with_name(&default_path.to_string_lossy()).required(false))
        .add_source(File::with_name(&env_path.to_string_lossy()).required(false))
        .add_source(
            Environment::with_prefix(&prefix)
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("scheduling.working_days"),
        );

    let raw_config: AppConfig = builder.build()?.try_deserialize()?;
    apply_env_overrides_from_marker(raw_config)
}

/// Recursively replaces all "secret_from_env" string values with environment variable values
fn inject_env_secrets(value: &mut Value) {
    fn walk(path: Vec<String>, obj: &mut Value) {
        match obj {
            Value::Object(map) => {
                for (k, v) in map.iter_mut() {
                    let mut new_path = path.clone();
                    new_path.push(k.to_string());
                    walk(new_path, v);
                }
            }
            Value::String(s) if s == SECRET_FROM_ENV => {
                let env_key = path.join("_").to_uppercase();
                if let Ok(env_val) = std::env::var(&env_key) {
                    *obj = Value::String(env_val);
                } else {
                    warn!("env var {} not found for secret_from_env", env_key);
                    *obj = Value::Null;
                }
            }
            _ => {}
        }
    }

    walk(vec![], value);
}

/// Applies environment overrides based on "secret_from_env" markers in serialized config.
///
/// A marker whose variable is missing becomes `null`, so an optional secret is
/// simply absent rather than the literal marker string.
pub fn apply_env_overrides_from_marker(config: AppConfig) -> Result<AppConfig, ConfigError> {
    let mut json = serde_json::to_value(&config)
        .map_err(|err| ConfigError::Message(format!("failed to serialize config: {err}")))?;
    inject_env_secrets(&mut json);
    serde_json::from_value(json)
        .map_err(|err| ConfigError::Message(format!("failed to rebuild config: {err}")))
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Loads the dotenv file once per process.
///
/// `DOTENV_OVERRIDE` names an alternative file; otherwise the first command line
/// argument is used when it starts with `.env`, falling back to `.env`.
/// Returns the path that was (or would have been) loaded.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path_override = std::env::var("DOTENV_OVERRIDE").ok();
    let dotenv_path_arg = env::args().nth(1).filter(|s| s.starts_with(".env"));

    let dotenv_path = dotenv_path_override
        .or(dotenv_path_arg)
        .unwrap_or_else(|| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_clinic_window() {
        let config = AppConfig::default();
        assert_eq!(config.scheduling.work_start, "09:00");
        assert_eq!(config.scheduling.work_end, "17:00");
        assert_eq!(config.scheduling.slot_minutes, 30);
        assert_eq!(config.scheduling.working_days.len(), 7);
        assert!(config.auth.is_none());
    }

    #[test]
    fn secret_marker_is_resolved_from_env() {
        std::env::set_var("AUTH_SHARED_SECRET", "s3cr3t");
        let config = AppConfig {
            auth: Some(AuthConfig {
                shared_secret: Some(SECRET_FROM_ENV.to_string()),
                trust_identity_headers: false,
            }),
            ..Default::default()
        };

        let resolved = apply_env_overrides_from_marker(config).expect("config rebuilds");
        assert_eq!(
            resolved.auth.and_then(|a| a.shared_secret).as_deref(),
            Some("s3cr3t")
        );
    }

    #[test]
    fn missing_secret_marker_becomes_none() {
        let config = AppConfig {
            database: Some(DatabaseConfig {
                url: "sqlite:unused.db".to_string(),
            }),
            logging: LoggingConfig {
                level: "debug".to_string(),
                directory: Some(SECRET_FROM_ENV.to_string()),
            },
            ..Default::default()
        };
        std::env::remove_var("LOGGING_DIRECTORY");

        let resolved = apply_env_overrides_from_marker(config).expect("config rebuilds");
        assert!(resolved.logging.directory.is_none());
        assert_eq!(resolved.logging.level, "debug");
    }

    #[test]
    fn missing_config_dir_falls_back_to_defaults() {
        let config = load_config_from(Path::new("does/not/exist")).expect("defaults load");
        assert_eq!(config.scheduling.slot_minutes, 30);
    }
}
