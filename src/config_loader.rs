use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_CONFIG_FILE: &str = "crop_advisor.toml";
pub const ENV_PREFIX: &str = "CROP_ADVISOR_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

/// Locations of the three pre-fitted artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub scaler_path: String,
    pub classifier_path: String,
    pub encoder_path: String,
    /// Expected SHA-256 per artifact (`scaler`, `classifier`, `label_encoder`).
    #[serde(default)]
    pub checksums: BTreeMap<String, String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            scaler_path: "models/feature_scaler.json".to_string(),
            classifier_path: "models/crop_classifier.json".to_string(),
            encoder_path: "models/label_encoder.json".to_string(),
            checksums: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// TOML file replacing the built-in crop profiles.
    #[serde(default)]
    pub profiles_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdvisorConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Layer defaults, then the TOML file, then `CROP_ADVISOR_*` environment
/// variables (`__` separates nested keys, e.g. `CROP_ADVISOR_SERVER__PORT`).
pub fn load_config(path: Option<&str>) -> Result<AdvisorConfig, figment::Error> {
    let figment = Figment::from(Serialized::defaults(AdvisorConfig::default()))
        .merge(Toml::file(path.unwrap_or(DEFAULT_CONFIG_FILE)))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: AdvisorConfig = figment.extract()?;

    if config.server.port == 0 {
        return Err(figment::Error::from("server.port must be non-zero"));
    }
    if crate::log_sink::parse_level(&config.logging.level).is_none() {
        return Err(figment::Error::from(format!(
            "logging.level '{}' is not one of trace, debug, info, warn, error",
            config.logging.level
        )));
    }

    Ok(config)
}
