//! Renderers
//!
//! A renderer turns one `LogEvent` into bytes appended to the drain worker's
//! scratch buffer. The built-in renderers are:
//!
//! - [`JsonFormatter`] - one compact JSON object per line (default)
//! - [`TextFormatter`] - the rendered message per line
//! - [`OutputTemplate`] - text lines laid out by an output template
//!
//! Callers can supply their own via [`ConsoleSinkOptions::with_formatter`].
//! The strategy is picked once at construction ([`Formatter::from_options`]).
//!
//! [`ConsoleSinkOptions::with_formatter`]: crate::ConsoleSinkOptions::with_formatter

mod json;
mod output_template;
mod text;

use std::fmt;
use std::sync::Arc;

use bytes::BytesMut;
use thiserror::Error;

use crate::console::ConsoleSinkOptions;
use crate::event::LogEvent;

pub use json::JsonFormatter;
pub use output_template::{LevelFormat, OutputTemplate};
pub use text::TextFormatter;

/// Rendering failure for a single event
///
/// The drain worker skips the event and keeps going.
#[derive(Debug, Error)]
pub enum RenderError {
    /// JSON serialization failed
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Text formatting failed
    #[error("formatting failed")]
    Format(#[from] fmt::Error),

    /// Custom formatter reported an error
    #[error("custom formatter failed: {0}")]
    Custom(String),

    /// Formatter panicked
    #[error("formatter panicked: {0}")]
    Panicked(String),
}

impl RenderError {
    /// Create a custom formatter error
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}

/// Event renderer
///
/// Implementations append the rendered event (normally one `\n`-terminated
/// line) to `buf`. They are called from the drain worker only, one event at a
/// time, but must be `Send + Sync` to be shared with it.
pub trait Render: Send + Sync {
    fn render(&self, event: &LogEvent, buf: &mut BytesMut) -> Result<(), RenderError>;
}

/// Adapter turning a closure into a [`Render`] implementation
///
/// ```
/// use bytes::BufMut;
/// use fastlog_sink::{FnFormatter, LogEvent, LogLevel, Render};
///
/// let formatter = FnFormatter::new(|event: &LogEvent, buf: &mut bytes::BytesMut| {
///     buf.put_slice(event.level().short_name().as_bytes());
///     buf.put_u8(b'\n');
///     Ok(())
/// });
///
/// let mut buf = bytes::BytesMut::new();
/// formatter.render(&LogEvent::new(LogLevel::Warning, "x"), &mut buf).unwrap();
/// assert_eq!(&buf[..], b"WRN\n");
/// ```
pub struct FnFormatter<F>(F);

impl<F> FnFormatter<F>
where
    F: Fn(&LogEvent, &mut BytesMut) -> Result<(), RenderError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Render for FnFormatter<F>
where
    F: Fn(&LogEvent, &mut BytesMut) -> Result<(), RenderError> + Send + Sync,
{
    fn render(&self, event: &LogEvent, buf: &mut BytesMut) -> Result<(), RenderError> {
        (self.0)(event, buf)
    }
}

/// The renderer a sink uses, chosen once from its options
#[derive(Clone)]
pub enum Formatter {
    Json(JsonFormatter),
    Text(TextFormatter),
    Template(OutputTemplate),
    Custom(Arc<dyn Render>),
}

impl Formatter {
    /// Pick the renderer: custom, then JSON, then output template, then text
    pub fn from_options(options: &ConsoleSinkOptions) -> Self {
        if let Some(custom) = &options.custom_formatter {
            return Self::Custom(Arc::clone(custom));
        }
        if options.use_json {
            return Self::Json(JsonFormatter);
        }
        match &options.output_template {
            Some(template) => Self::Template(OutputTemplate::new(template, options.color)),
            None => Self::Text(TextFormatter),
        }
    }

    /// Short name for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Json(_) => "json",
            Self::Text(_) => "text",
            Self::Template(_) => "template",
            Self::Custom(_) => "custom",
        }
    }
}

impl Render for Formatter {
    fn render(&self, event: &LogEvent, buf: &mut BytesMut) -> Result<(), RenderError> {
        match self {
            Self::Json(f) => f.render(event, buf),
            Self::Text(f) => f.render(event, buf),
            Self::Template(f) => f.render(event, buf),
            Self::Custom(f) => f.render(event, buf),
        }
    }
}

impl fmt::Debug for Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template(template) => f.debug_tuple("Template").field(template).finish(),
            other => f.write_str(other.kind()),
        }
    }
}
