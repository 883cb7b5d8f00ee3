//! fastlog - Sink
//!
//! Asynchronous, backpressure-aware console sink for structured log events.
//!
//! # Architecture
//!
//! Producers on any thread hand `LogEvent`s to a `ConsoleSink`. Events wait in
//! a FIFO queue until the single drain worker renders them into a reusable
//! scratch buffer and writes them to the output stream.
//!
//! ```text
//! [Producers] --LogEvent--> [EventQueue] --> [DrainWorker] --render--> [stdout]
//!                 (block / drop when full)      (one thread, one writer)
//! ```
//!
//! Producers never touch the output stream, so there is no lock around it and
//! lines are never interleaved. Shutdown closes the queue, drains everything
//! that was accepted, flushes, and closes the stream.
//!
//! # Example
//!
//! ```no_run
//! use fastlog_sink::{ConsoleSink, ConsoleSinkOptions, LogEvent, LogLevel};
//!
//! let sink = ConsoleSink::new(ConsoleSinkOptions::default().with_queue_limit(10_000))?;
//!
//! sink.enqueue(
//!     LogEvent::new(LogLevel::Information, "hello {name}").with_property("name", "world"),
//! );
//!
//! sink.shutdown();
//! # Ok::<(), fastlog_sink::SinkError>(())
//! ```

// =============================================================================
// Event model
// =============================================================================

/// Log events, levels and structured property values
pub mod event;

/// Message template parsing and rendering
pub mod template;

// =============================================================================
// Delivery pipeline
// =============================================================================

/// Renderers turning events into output lines (JSON, text, output template)
pub mod render;

/// Multi-producer, single-consumer event queue with full-queue policy
pub mod queue;

/// The single drain worker that owns the output stream
pub mod worker;

/// Console sink - the public entry point
pub mod console;

// =============================================================================
// Supporting modules
// =============================================================================

/// TOML configuration for the console sink
pub mod config;

/// In-memory output stream for tests and embedding
pub mod capture;

/// Shared utilities (rate-limited error logging)
pub mod util;

/// Common types shared by the sink (errors, metrics)
mod common;

// =============================================================================
// Public re-exports
// =============================================================================

pub use capture::CaptureWriter;
pub use common::{ConsoleSinkMetrics, MetricsSnapshot, SinkError};
pub use config::{ConfigError, ConsoleSinkConfig};
pub use console::{ConsoleSink, ConsoleSinkOptions, SinkState};
pub use event::{LogEvent, LogLevel, Properties, PropertyValue, Scalar};
pub use queue::{EventQueue, TryEnqueueError, TryRecvError};
pub use render::{
    FnFormatter, Formatter, JsonFormatter, OutputTemplate, Render, RenderError, TextFormatter,
};
pub use template::MessageTemplate;
