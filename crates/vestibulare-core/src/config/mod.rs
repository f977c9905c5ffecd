//! Application configuration schemas.
//!
//! All configuration structs are deserialized through the `config` crate
//! from optional TOML files plus `VESTIBULARE__*` environment variables.
//! Each sub-module represents a logical configuration section. The
//! resulting [`AppConfig`] is loaded once at process start and treated as
//! read-only afterwards.

pub mod app;
pub mod database;
pub mod dispatch;
pub mod logging;
pub mod notifier;
pub mod operator;
pub mod plans;
pub mod worker;

use serde::{Deserialize, Serialize};

pub use self::app::ServerConfig;
pub use self::database::DatabaseConfig;
pub use self::dispatch::{DispatchConfig, QuotaCycle};
pub use self::logging::LoggingConfig;
pub use self::notifier::{NotifierConfig, NotifierMode};
pub use self::operator::OperatorConfig;
pub use self::plans::{PlanConfig, PlansConfig};
pub use self::worker::WorkerConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Alert sweep and broadcast settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Scheduled job settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Operator endpoint settings.
    #[serde(default)]
    pub operator: OperatorConfig,
    /// Outbound notifier settings.
    #[serde(default)]
    pub notifier: NotifierConfig,
    /// Subscription plan table.
    #[serde(default)]
    pub plans: PlansConfig,
}

impl AppConfig {
    /// Load configuration from TOML files and the environment.
    ///
    /// Merges `config/default.toml`, then `config/{env}.toml`, then
    /// environment variables prefixed with `VESTIBULARE__` (nested keys
    /// separated by `__`, e.g. `VESTIBULARE__DATABASE__URL`).
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("VESTIBULARE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
