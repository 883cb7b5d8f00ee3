//! Console sink options

use std::fmt;
use std::sync::Arc;

use crate::render::Render;

/// Default output write buffer (64 KiB)
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Default sink name used in diagnostics
pub const DEFAULT_SINK_NAME: &str = "console";

/// Options for a [`ConsoleSink`](super::ConsoleSink)
///
/// Fixed once the sink is built.
#[derive(Clone)]
pub struct ConsoleSinkOptions {
    /// Sink name used in diagnostics and as the drain thread prefix
    pub name: String,

    /// Maximum buffered events (`None` = unbounded)
    pub queue_limit: Option<usize>,

    /// Block producers when the bounded queue is full (otherwise drop)
    pub block_when_full: bool,

    /// Render JSON lines (otherwise text)
    pub use_json: bool,

    /// Text-mode line layout (see [`OutputTemplate`](crate::OutputTemplate))
    pub output_template: Option<String>,

    /// Color the level token in output templates
    pub color: bool,

    /// Output write buffer size
    pub buffer_size: usize,

    /// Caller-supplied renderer; overrides every built-in
    pub custom_formatter: Option<Arc<dyn Render>>,
}

impl Default for ConsoleSinkOptions {
    fn default() -> Self {
        Self {
            name: DEFAULT_SINK_NAME.to_string(),
            queue_limit: None,
            block_when_full: false,
            use_json: true,
            output_template: None,
            color: false,
            buffer_size: DEFAULT_BUFFER_SIZE,
            custom_formatter: None,
        }
    }
}

impl ConsoleSinkOptions {
    /// Bound the queue
    #[must_use]
    pub fn with_queue_limit(mut self, limit: usize) -> Self {
        self.queue_limit = Some(limit);
        self
    }

    /// Block producers instead of dropping when the bounded queue is full
    #[must_use]
    pub fn block_when_full(mut self) -> Self {
        self.block_when_full = true;
        self
    }

    /// Render plain text instead of JSON
    #[must_use]
    pub fn text(mut self) -> Self {
        self.use_json = false;
        self
    }

    /// Lay out text lines with an output template (text mode only)
    #[must_use]
    pub fn with_output_template(mut self, template: impl Into<String>) -> Self {
        self.output_template = Some(template.into());
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Use a custom renderer
    #[must_use]
    pub fn with_formatter(mut self, formatter: Arc<dyn Render>) -> Self {
        self.custom_formatter = Some(formatter);
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }
}

impl fmt::Debug for ConsoleSinkOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleSinkOptions")
            .field("name", &self.name)
            .field("queue_limit", &self.queue_limit)
            .field("block_when_full", &self.block_when_full)
            .field("use_json", &self.use_json)
            .field("output_template", &self.output_template)
            .field("color", &self.color)
            .field("buffer_size", &self.buffer_size)
            .field("custom_formatter", &self.custom_formatter.is_some())
            .finish()
    }
}
