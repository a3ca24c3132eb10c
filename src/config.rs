//! Runtime configuration for the data core.
//!
//! Settings are read from the `[core]` section of `config/config.toml`, with
//! `DATACORE__CORE__*` environment variables layered on top.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::schema::DataType;

const CONFIG_FILE: &str = "config/config.toml";

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CoreConfig {
    /// Minimum distance, in hours, before two date/times are treated as different when merging
    #[serde(default = "default_date_tolerance_hours")]
    pub date_tolerance_hours: i64,
    /// Upper bound on the length of an encoded entity reference
    #[serde(default = "default_max_reference_length")]
    pub max_reference_length: usize,
    /// Ordered numeric cultures tried by value inference (`invariant`, `comma`)
    #[serde(default = "default_number_cultures")]
    pub number_cultures: Vec<String>,
    /// chrono format strings tried by the generic date/time fallback
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,
    /// Type of the `Id` column added by the schema builder
    #[serde(default = "default_key_type")]
    pub default_key_type: DataType,
}

fn default_date_tolerance_hours() -> i64 {
    5
}

fn default_max_reference_length() -> usize {
    1024
}

fn default_number_cultures() -> Vec<String> {
    vec!["invariant".to_string(), "comma".to_string()]
}

fn default_date_formats() -> Vec<String> {
    [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d",
        "%d.%m.%Y %H:%M:%S",
        "%d.%m.%Y",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_key_type() -> DataType {
    DataType::Int64
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            date_tolerance_hours: default_date_tolerance_hours(),
            max_reference_length: default_max_reference_length(),
            number_cultures: default_number_cultures(),
            date_formats: default_date_formats(),
            default_key_type: default_key_type(),
        }
    }
}

impl CoreConfig {
    /// Load the core configuration from `config/config.toml`, falling back to env vars.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix("DATACORE").separator("__"));

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                if std::path::Path::new(CONFIG_FILE).exists() {
                    log::warn!(
                        "failed to load config file, falling back to env. Error: {}",
                        err
                    );
                }
                Config::builder()
                    .add_source(Environment::with_prefix("DATACORE").separator("__"))
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "Failed to load configuration from file and env: {}, then env-only error: {}",
                            err, env_err
                        ))
                    })?
            }
        };

        match settings.get::<CoreConfig>("core") {
            Ok(cfg) => Ok(cfg),
            // An absent section means every field keeps its default
            Err(ConfigError::NotFound(_)) => Ok(CoreConfig::default()),
            Err(e) => Err(ConfigError::Message(format!(
                "Core configuration could not be loaded from file or environment: {}",
                e
            ))),
        }
    }
}
