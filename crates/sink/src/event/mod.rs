//! Log event model
//!
//! A `LogEvent` is created by the upstream logging layer and is read-only to
//! the sink. It carries a timestamp, a level, a parsed message template with
//! its properties, and an optional multi-line exception text.
//!
//! # Example
//!
//! ```
//! use fastlog_sink::{LogEvent, LogLevel};
//!
//! let event = LogEvent::new(LogLevel::Warning, "disk {mount} at {percent}%")
//!     .with_property("mount", "/var")
//!     .with_property("percent", 93);
//!
//! assert_eq!(event.render_message(), "disk /var at 93%");
//! ```

mod value;

use std::error::Error as StdError;
use std::fmt::{self, Write as _};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::template::MessageTemplate;

pub use value::{Properties, PropertyValue, Scalar, TYPE_TAG_KEY};

// =============================================================================
// LogLevel
// =============================================================================

/// Event severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Verbose = 0,
    Debug = 1,
    #[default]
    Information = 2,
    Warning = 3,
    Error = 4,
    Fatal = 5,
}

impl LogLevel {
    /// All levels, lowest severity first
    pub const ALL: [LogLevel; 6] = [
        Self::Verbose,
        Self::Debug,
        Self::Information,
        Self::Warning,
        Self::Error,
        Self::Fatal,
    ];

    /// Parse from raw value
    #[inline]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Verbose,
            1 => Self::Debug,
            2 => Self::Information,
            3 => Self::Warning,
            4 => Self::Error,
            5 => Self::Fatal,
            _ => Self::Information, // Default to Information for unknown values
        }
    }

    /// Uppercase token used in JSON output
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Verbose => "VERBOSE",
            Self::Debug => "DEBUG",
            Self::Information => "INFORMATION",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
        }
    }

    /// Display name
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Verbose => "Verbose",
            Self::Debug => "Debug",
            Self::Information => "Information",
            Self::Warning => "Warning",
            Self::Error => "Error",
            Self::Fatal => "Fatal",
        }
    }

    /// Three-letter uppercase abbreviation
    #[inline]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Verbose => "VRB",
            Self::Debug => "DBG",
            Self::Information => "INF",
            Self::Warning => "WRN",
            Self::Error => "ERR",
            Self::Fatal => "FTL",
        }
    }

    /// Check if this is an error-level event (Error or Fatal)
    #[inline]
    pub const fn is_error(self) -> bool {
        matches!(self, Self::Error | Self::Fatal)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a level name is not recognized
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown log level '{0}'")]
pub struct ParseLevelError(String);

impl FromStr for LogLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "verbose" | "vrb" | "trace" => Ok(Self::Verbose),
            "debug" | "dbg" => Ok(Self::Debug),
            "information" | "info" | "inf" => Ok(Self::Information),
            "warning" | "warn" | "wrn" => Ok(Self::Warning),
            "error" | "err" => Ok(Self::Error),
            "fatal" | "ftl" => Ok(Self::Fatal),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

// =============================================================================
// LogEvent
// =============================================================================

/// One log occurrence
///
/// Built once with the `with_*` methods, then moved into the sink. Nothing
/// mutates an event after it has been enqueued.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    timestamp: DateTime<Utc>,
    level: LogLevel,
    template: MessageTemplate,
    properties: Properties,
    exception: Option<String>,
}

impl LogEvent {
    /// Create an event stamped with the current time
    pub fn new(level: LogLevel, template: impl Into<MessageTemplate>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            template: template.into(),
            properties: Properties::new(),
            exception: None,
        }
    }

    /// Override the timestamp
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Attach a property (replaces an existing property with the same name)
    #[must_use]
    pub fn with_property(
        mut self,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Self {
        self.properties.insert(name, value);
        self
    }

    /// Replace all properties
    #[must_use]
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    /// Attach exception text verbatim
    #[must_use]
    pub fn with_exception(mut self, exception: impl Into<String>) -> Self {
        self.exception = Some(exception.into());
        self
    }

    /// Attach an error and its `source()` chain as exception text
    ///
    /// ```text
    /// connection refused
    ///   caused by: os error 111
    /// ```
    #[must_use]
    pub fn with_error(mut self, error: &(dyn StdError + 'static)) -> Self {
        let mut text = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            let _ = write!(text, "\n  caused by: {cause}");
            source = cause.source();
        }
        self.exception = Some(text);
        self
    }

    /// When the event occurred
    #[inline]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Event severity
    #[inline]
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// The parsed message template
    #[inline]
    pub fn message_template(&self) -> &MessageTemplate {
        &self.template
    }

    /// Event properties in insertion order
    #[inline]
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Look up a single property
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Exception text, if any
    #[inline]
    pub fn exception(&self) -> Option<&str> {
        self.exception.as_deref()
    }

    /// Render the message template against the event's properties
    pub fn render_message(&self) -> String {
        self.template.render_to_string(&self.properties)
    }
}
