//! Layered runtime settings.
//!
//! Sources, later ones winning: built-in defaults, `config/default.toml`,
//! `config/local.toml`, then `TRAILSCOUT__SECTION__KEY` environment
//! variables. A `.env` file is read into the environment first.

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use serde::Deserialize;

pub const ENV_PREFIX: &str = "TRAILSCOUT";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub log: LogSettings,
    pub discovery: DiscoverySection,
    pub seed: SeedSection,
    pub simulation: SimulationSection,
    /// The `.env` file read by [`Settings::load`], if any
    #[serde(skip)]
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `EnvFilter` directive, e.g. `info` or `services=debug,info`
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DiscoverySection {
    /// Clue window around the user when a trail has no region, in meters
    pub default_map_radius_m: f64,
}

impl Default for DiscoverySection {
    fn default() -> Self {
        Self {
            default_map_radius_m: 5_000.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SeedSection {
    /// JSON file with trails and spots loaded at startup
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationSection {
    pub scenario_path: Option<PathBuf>,
}

impl Settings {
    /// Loads from `./config` and the process environment. Nothing is
    /// logged here; tracing is not installed until settings are known.
    pub fn load() -> Result<Self, ConfigError> {
        let env_file = dotenvy::dotenv().ok();
        let mut settings = Self::load_from(Path::new("config"))?;
        settings.env_file = env_file;
        Ok(settings)
    }

    pub fn load_from(dir: &Path) -> Result<Self, ConfigError> {
        let builder = config::Config::builder()
            .add_source(File::from(dir.join("default.toml")).required(false))
            .add_source(File::from(dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );
        Self::from_builder(builder)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let radius = self.discovery.default_map_radius_m;
        if !radius.is_finite() || radius <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "discovery.default_map_radius_m must be positive, got {radius}"
            )));
        }
        if self.log.level.trim().is_empty() {
            return Err(ConfigError::Invalid("log.level must not be empty".into()));
        }
        Ok(())
    }
}
