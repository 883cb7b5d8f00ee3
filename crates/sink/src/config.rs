//! Console sink configuration
//!
//! Loaded from TOML; every field is optional:
//!
//! ```toml
//! name = "console"
//! queue_limit = 10000
//! block_when_full = false
//! use_json = false
//! output_template = "[{Timestamp:%H:%M:%S} {Level:u3}] {Message}{NewLine}{Exception}"
//! color = true
//! buffer_size = 65536
//! ```

use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use crate::console::{ConsoleSinkOptions, DEFAULT_BUFFER_SIZE, DEFAULT_SINK_NAME};

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("failed to read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A field holds a value the sink cannot use
    #[error("invalid {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    /// Create an invalid value error
    pub fn invalid_value(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            message: message.into(),
        }
    }
}

/// Console sink configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsoleSinkConfig {
    /// Sink name used in diagnostics
    pub name: String,

    /// Maximum buffered events (absent = unbounded)
    pub queue_limit: Option<usize>,

    /// Block producers when the bounded queue is full
    pub block_when_full: bool,

    /// Render JSON lines (default: true)
    pub use_json: bool,

    /// Text-mode line layout
    pub output_template: Option<String>,

    /// Color the level token in output templates
    pub color: bool,

    /// Output write buffer size in bytes (default: 64 KiB)
    pub buffer_size: usize,
}

impl Default for ConsoleSinkConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_SINK_NAME.to_string(),
            queue_limit: None,
            block_when_full: false,
            use_json: true,
            output_template: None,
            color: false,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl ConsoleSinkConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::invalid_value("name", "must not be empty"));
        }
        if self.buffer_size == 0 {
            return Err(ConfigError::invalid_value("buffer_size", "must be greater than 0"));
        }
        if self.queue_limit == Some(0) {
            return Err(ConfigError::invalid_value("queue_limit", "must be at least 1"));
        }
        if self
            .output_template
            .as_deref()
            .is_some_and(|t| t.trim().is_empty())
        {
            return Err(ConfigError::invalid_value("output_template", "must not be blank"));
        }

        if self.block_when_full && self.queue_limit.is_none() {
            tracing::warn!(
                sink = %self.name,
                "block_when_full has no effect without queue_limit"
            );
        }
        if self.use_json && self.output_template.is_some() {
            tracing::warn!(
                sink = %self.name,
                "output_template is ignored while use_json is enabled"
            );
        }

        Ok(())
    }
}

impl FromStr for ConsoleSinkConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let config: ConsoleSinkConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

impl From<ConsoleSinkConfig> for ConsoleSinkOptions {
    fn from(config: ConsoleSinkConfig) -> Self {
        Self {
            name: config.name,
            queue_limit: config.queue_limit,
            block_when_full: config.block_when_full,
            use_json: config.use_json,
            output_template: config.output_template,
            color: config.color,
            buffer_size: config.buffer_size,
            custom_formatter: None,
        }
    }
}
