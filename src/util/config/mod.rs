//! objcore runtime configuration
//!
//! # Configuration hierarchy
//!
//! ```text
//! Priority (high → low):
//! 1. Environment variables (OBJCORE_LOG, OBJCORE_FLOAT_EPSILON)
//! 2. Config file (JSON)
//! 3. Default values
//! ```
//!
//! # Usage
//!
//! ```rust
//! use objcore::util::config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_json_str(r#"{ "float_epsilon": 1e-9 }"#).unwrap();
//! assert_eq!(config.float_epsilon, 1e-9);
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::util::logger::LogLevel;

/// Environment variable overriding `log_level`
pub const ENV_LOG: &str = "OBJCORE_LOG";

/// Environment variable overriding `float_epsilon`
pub const ENV_FLOAT_EPSILON: &str = "OBJCORE_FLOAT_EPSILON";

/// Default relative tolerance for float `Value` comparison
pub const DEFAULT_FLOAT_EPSILON: f64 = f64::EPSILON * 4.0;

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Level used when the runtime installs its own logger
    #[serde(default)]
    pub log_level: LogLevel,
    /// Relative tolerance used by float comparison
    #[serde(default = "default_float_epsilon")]
    pub float_epsilon: f64,
    /// Register builtin library types (string) at init instead of on first use
    #[serde(default = "default_register_builtin_types")]
    pub register_builtin_types: bool,
    /// Install a `tracing` subscriber at init
    #[serde(default)]
    pub install_logger: bool,
}

fn default_float_epsilon() -> f64 {
    DEFAULT_FLOAT_EPSILON
}

fn default_register_builtin_types() -> bool {
    true
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            float_epsilon: DEFAULT_FLOAT_EPSILON,
            register_builtin_types: true,
            install_logger: false,
        }
    }
}

impl RuntimeConfig {
    /// Parse a configuration from JSON text
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Load a configuration file if present, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Apply environment variable overrides
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_overrides(
            std::env::var(ENV_LOG).ok().as_deref(),
            std::env::var(ENV_FLOAT_EPSILON).ok().as_deref(),
        )
    }

    fn apply_overrides(
        mut self,
        log: Option<&str>,
        epsilon: Option<&str>,
    ) -> Result<Self, ConfigError> {
        if let Some(level) = log {
            self.log_level = level.parse().map_err(|reason| ConfigError::InvalidValue {
                key: ENV_LOG,
                reason,
            })?;
        }
        if let Some(eps) = epsilon {
            self.float_epsilon =
                eps.trim()
                    .parse()
                    .map_err(|e: std::num::ParseFloatError| ConfigError::InvalidValue {
                        key: ENV_FLOAT_EPSILON,
                        reason: e.to_string(),
                    })?;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.float_epsilon.is_finite() || self.float_epsilon < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "float_epsilon",
                reason: format!("must be finite and non-negative, got {}", self.float_epsilon),
            });
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for `{key}`: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}
