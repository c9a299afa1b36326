//! Configuration for the daily pipeline.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AggregationError, Result};

/// Configuration for the daily pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Site altitude in metres, used for clear-sky radiation and the
    /// fallback atmospheric pressure.
    pub altitude_m: f64,

    /// Surface albedo applied to incoming shortwave radiation.
    pub albedo: f64,

    /// Number of days processed concurrently by the batch runner.
    pub workers: usize,

    /// Log output settings.
    pub logging: LoggingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            altitude_m: 200.0,
            albedo: 0.0,
            workers: 4,
            logging: LoggingConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables on top of the defaults.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Parse configuration from YAML text. Missing keys keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| AggregationError::InvalidConfig(e.to_string()))
    }

    /// Read configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| AggregationError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&yaml)
    }

    /// Apply `DAILY_*` environment variables over this configuration.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("DAILY_ALTITUDE_M") {
            if let Ok(altitude) = val.parse() {
                self.altitude_m = altitude;
            }
        }

        if let Ok(val) = std::env::var("DAILY_ALBEDO") {
            if let Ok(albedo) = val.parse() {
                self.albedo = albedo;
            }
        }

        if let Ok(val) = std::env::var("DAILY_WORKERS") {
            if let Ok(workers) = val.parse() {
                self.workers = workers;
            }
        }

        if let Ok(val) = std::env::var("DAILY_LOG_LEVEL") {
            self.logging.level = val;
        }

        if let Ok(val) = std::env::var("DAILY_LOG_FORMAT") {
            self.logging.format = LogFormat::from_str(&val);
        }

        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.altitude_m.is_finite() {
            return Err("altitude_m must be finite".to_string());
        }

        if !(0.0..1.0).contains(&self.albedo) {
            return Err("albedo must be in [0, 1)".to_string());
        }

        if self.workers == 0 {
            return Err("workers must be > 0".to_string());
        }

        self.logging.validate()
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of trace, debug, info, warn, error.
    pub level: String,

    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        match self.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable multi-line output.
    Pretty,
}

impl LogFormat {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Self::Pretty,
            _ => Self::Json,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
