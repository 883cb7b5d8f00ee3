//! Common types and utilities for the sink
//!
//! Errors surfaced at construction time and the counters shared between the
//! sink, its producers and the drain worker.

use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

use crate::config::ConfigError;

/// Metrics for the console sink
///
/// Producers record `enqueued`/`dropped`, the drain worker records everything
/// else. All counters use relaxed ordering: they are observability data, not
/// synchronization.
#[derive(Debug, Default)]
pub struct ConsoleSinkMetrics {
    /// Events accepted into the queue
    events_enqueued: AtomicU64,

    /// Events lost (queue full, queue closed, or output stream failed)
    events_dropped: AtomicU64,

    /// Events rendered and written to the output stream
    events_written: AtomicU64,

    /// Bytes written to the output stream
    bytes_written: AtomicU64,

    /// Events skipped because rendering failed
    render_errors: AtomicU64,

    /// Write or flush failures on the output stream
    write_errors: AtomicU64,

    /// Flush operations performed
    flush_count: AtomicU64,
}

impl ConsoleSinkMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            events_enqueued: AtomicU64::new(0),
            events_dropped: AtomicU64::new(0),
            events_written: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            render_errors: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
            flush_count: AtomicU64::new(0),
        }
    }

    /// Record an event accepted by the queue
    #[inline]
    pub fn record_enqueued(&self) {
        self.events_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a lost event
    #[inline]
    pub fn record_dropped(&self) {
        self.events_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record several lost events at once
    #[inline]
    pub fn record_dropped_many(&self, count: u64) {
        self.events_dropped.fetch_add(count, Ordering::Relaxed);
    }

    /// Record events that reached the output stream
    #[inline]
    pub fn record_written_many(&self, events: u64, bytes: u64) {
        self.events_written.fetch_add(events, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a rendering failure
    #[inline]
    pub fn record_render_error(&self) {
        self.render_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an output stream failure
    #[inline]
    pub fn record_write_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a flush
    #[inline]
    pub fn record_flush(&self) {
        self.flush_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_enqueued: self.events_enqueued.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            events_written: self.events_written.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            render_errors: self.render_errors.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            flush_count: self.flush_count.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of sink metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub events_enqueued: u64,
    pub events_dropped: u64,
    pub events_written: u64,
    pub bytes_written: u64,
    pub render_errors: u64,
    pub write_errors: u64,
    pub flush_count: u64,
}

/// Sink construction errors
///
/// Only returned while building a sink. Once running, nothing is surfaced to
/// producers.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Sink initialization failed (runtime or drain thread)
    #[error("failed to initialize sink: {0}")]
    Init(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl SinkError {
    /// Create an initialization error
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Init(msg.into())
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod common_test;
