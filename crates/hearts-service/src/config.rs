use hearts_bot::AIConfig;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

const PLAY_ONE_SIMULATIONS: i64 = 1000;
const PLAY_ONE_WORLDS: i64 = 20;

/// Root service configuration loaded from YAML.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Settings for `/api/move`; fields present in a request's `ai_config` override them.
    pub defaults: AIConfig,
    /// Fast settings used by `/api/play-one`.
    pub play_one: PlayOneConfig,
    pub logging: LoggingConfig,
    /// Fixed seed for replaying decisions; entropy when absent.
    pub seed: Option<u64>,
}

impl ServiceConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: ServiceConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        self.defaults
            .validate()
            .map_err(|err| ValidationError::prefixed("defaults", err))?;
        self.play_one
            .to_ai_config()
            .validate()
            .map_err(|err| ValidationError::prefixed("play_one", err))?;
        self.logging.normalize();
        if self.logging.level().is_none() {
            return Err(ValidationError::InvalidField {
                field: "logging.tracing_level".to_string(),
                message: format!("unknown level '{}'", self.logging.tracing_level),
            });
        }
        Ok(())
    }
}

/// Fast settings for `/api/play-one`; fewer worlds than the move endpoint.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PlayOneConfig {
    pub simulations: i64,
    pub worlds: i64,
    pub epsilon: f64,
    pub use_threads: bool,
    pub player_type: String,
}

impl Default for PlayOneConfig {
    fn default() -> Self {
        let base = AIConfig::default();
        Self {
            simulations: PLAY_ONE_SIMULATIONS,
            worlds: PLAY_ONE_WORLDS,
            epsilon: base.epsilon,
            use_threads: base.use_threads,
            player_type: base.player_type,
        }
    }
}

impl PlayOneConfig {
    pub fn to_ai_config(&self) -> AIConfig {
        AIConfig {
            simulations: self.simulations,
            worlds: self.worlds,
            epsilon: self.epsilon,
            use_threads: self.use_threads,
            player_type: self.player_type.clone(),
        }
    }
}

/// Logging configuration defaults to plain text on stderr at `info`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub structured: bool,
    pub tracing_level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            structured: false,
            tracing_level: default_tracing_level(),
            file: None,
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}

impl ValidationError {
    fn prefixed(section: &str, err: hearts_bot::ValidationError) -> Self {
        let hearts_bot::ValidationError::InvalidField { field, message } = err;
        ValidationError::InvalidField {
            field: format!("{section}.{field}"),
            message,
        }
    }
}
