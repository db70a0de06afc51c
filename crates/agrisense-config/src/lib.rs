//! Configuration loading for AgriSense.
//! Reads agrisense.toml from the current directory or the path in AGRISENSE_CONFIG.
//! Every section and field is optional; a missing file yields the defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const CONFIG_ENV: &str = "AGRISENSE_CONFIG";
pub const PORT_ENV: &str = "AGRISENSE_PORT";
pub const DEFAULT_CONFIG_FILE: &str = "agrisense.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read { path: String, source: std::io::Error },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16    { 8000 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Directory holding the persisted classifier/scaler pair
    #[serde(default = "default_model_dir")]
    pub dir: String,
    #[serde(default = "default_model_file")]
    pub model_file: String,
    #[serde(default = "default_scaler_file")]
    pub scaler_file: String,
    /// Maximum number of crops considered per prediction
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Crops at or below this probability are dropped
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u64,
    /// L2 penalty of the logistic-regression fit
    #[serde(default = "default_regularization")]
    pub regularization: f64,
    /// pH used when a prediction request carries none
    #[serde(default = "default_soil_ph")]
    pub default_soil_ph: f64,
}

fn default_model_dir()      -> String { "models".to_string() }
fn default_model_file()     -> String { "crop_recommendation_model.json".to_string() }
fn default_scaler_file()    -> String { "crop_scaler.json".to_string() }
fn default_top_k()          -> usize  { 3 }
fn default_min_confidence() -> f64    { 0.10 }
fn default_max_iterations() -> u64    { 200 }
fn default_regularization() -> f64    { 1.0 }
fn default_soil_ph()        -> f64    { 6.5 }

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            dir: default_model_dir(),
            model_file: default_model_file(),
            scaler_file: default_scaler_file(),
            top_k: default_top_k(),
            min_confidence: default_min_confidence(),
            max_iterations: default_max_iterations(),
            regularization: default_regularization(),
            default_soil_ph: default_soil_ph(),
        }
    }
}

impl ModelConfig {
    pub fn model_path(&self) -> PathBuf {
        Path::new(&self.dir).join(&self.model_file)
    }

    pub fn scaler_path(&self) -> PathBuf {
        Path::new(&self.dir).join(&self.scaler_file)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "bool_true")]
    pub seed_demo_data: bool,
    /// Fixed RNG seed for reproducible demo rows
    #[serde(default)]
    pub seed: Option<u64>,
}

fn bool_true() -> bool { true }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { seed_demo_data: true, seed: None }
    }
}


impl Config {
    /// Load configuration from agrisense.toml.
    /// Checks AGRISENSE_CONFIG first, then the current directory; applies
    /// the AGRISENSE_PORT override last.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV)
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        let mut config = if Path::new(&path).exists() {
            Self::from_file(&path)?
        } else {
            info!("Config file {} not found, using defaults", path);
            Self::default()
        };

        if let Ok(port) = std::env::var(PORT_ENV) {
            config.server.port = port.trim().parse().map_err(|e| ConfigError::Invalid {
                field: "server.port",
                reason: format!("{}: {}", PORT_ENV, e),
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let m = &self.model;
        if m.top_k == 0 {
            return Err(ConfigError::Invalid { field: "model.top_k", reason: "must be at least 1".into() });
        }
        if !(0.0..1.0).contains(&m.min_confidence) {
            return Err(ConfigError::Invalid {
                field: "model.min_confidence",
                reason: format!("{} is outside [0, 1)", m.min_confidence),
            });
        }
        if m.max_iterations == 0 {
            return Err(ConfigError::Invalid { field: "model.max_iterations", reason: "must be at least 1".into() });
        }
        if !m.regularization.is_finite() || m.regularization < 0.0 {
            return Err(ConfigError::Invalid {
                field: "model.regularization",
                reason: format!("{} is not a non-negative number", m.regularization),
            });
        }
        if !m.default_soil_ph.is_finite() {
            return Err(ConfigError::Invalid { field: "model.default_soil_ph", reason: "must be finite".into() });
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
