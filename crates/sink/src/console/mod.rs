//! Console sink
//!
//! The public entry point. A `ConsoleSink` owns the event queue and the drain
//! thread; producers call [`ConsoleSink::enqueue`] from any thread and never
//! touch the output stream.
//!
//! # Lifecycle
//!
//! ```text
//! Running --shutdown()--> Draining --worker done--> Closed
//! ```
//!
//! `shutdown()` is idempotent and also runs on drop. It closes the queue,
//! waits for every accepted event to be written, flushes and closes the
//! stream. Events offered after shutdown started are dropped and counted.

mod options;

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread::JoinHandle;

use parking_lot::Mutex;
use tokio::io::AsyncWrite;

use crate::common::{ConsoleSinkMetrics, MetricsSnapshot, SinkError};
use crate::config::{ConfigError, ConsoleSinkConfig};
use crate::event::LogEvent;
use crate::queue::EventQueue;
use crate::render::Formatter;
use crate::worker::{DrainWorker, panic_message};

pub use options::{ConsoleSinkOptions, DEFAULT_BUFFER_SIZE, DEFAULT_SINK_NAME};

/// Sink lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SinkState {
    /// Accepting events
    Running = 0,
    /// Shutdown in progress; the worker is draining the queue
    Draining = 1,
    /// Worker finished, stream closed
    Closed = 2,
}

impl SinkState {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Running,
            1 => Self::Draining,
            _ => Self::Closed,
        }
    }
}

/// Asynchronous console sink
///
/// ```no_run
/// use fastlog_sink::{ConsoleSink, ConsoleSinkOptions, LogEvent, LogLevel};
///
/// let sink = ConsoleSink::new(ConsoleSinkOptions::default().with_queue_limit(1000))?;
/// sink.enqueue(LogEvent::new(LogLevel::Information, "started"));
/// sink.shutdown();
/// # Ok::<(), fastlog_sink::SinkError>(())
/// ```
pub struct ConsoleSink {
    name: String,
    queue: Arc<EventQueue>,
    metrics: Arc<ConsoleSinkMetrics>,
    state: AtomicU8,
    /// Drain thread handle; taken by the first `shutdown()`
    worker: Mutex<Option<JoinHandle<MetricsSnapshot>>>,
}

impl ConsoleSink {
    /// Create a sink writing to the process stdout
    pub fn new(options: ConsoleSinkOptions) -> Result<Self, SinkError> {
        Self::with_writer(options, tokio::io::stdout())
    }

    /// Create a sink writing to `writer`
    ///
    /// The writer is owned by the drain thread for the sink's whole life and
    /// shut down exactly once when the sink closes.
    pub fn with_writer<W>(options: ConsoleSinkOptions, writer: W) -> Result<Self, SinkError>
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        if options.buffer_size == 0 {
            return Err(ConfigError::invalid_value("buffer_size", "must be greater than 0").into());
        }

        let formatter = Formatter::from_options(&options);
        let formatter_kind = formatter.kind();
        let queue = Arc::new(EventQueue::new(options.queue_limit, options.block_when_full));
        let metrics = Arc::new(ConsoleSinkMetrics::new());

        let worker = DrainWorker::new(
            options.name.clone(),
            Arc::clone(&queue),
            formatter,
            writer,
            options.buffer_size,
            Arc::clone(&metrics),
        );
        let handle = worker.spawn()?;

        tracing::info!(
            sink = %options.name,
            queue_limit = ?queue.limit(),
            block_when_full = queue.blocks_when_full(),
            formatter = formatter_kind,
            "console sink starting"
        );

        Ok(Self {
            name: options.name,
            queue,
            metrics,
            state: AtomicU8::new(SinkState::Running as u8),
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Create a stdout sink from validated configuration
    pub fn from_config(config: &ConsoleSinkConfig) -> Result<Self, SinkError> {
        config.validate()?;
        Self::new(ConsoleSinkOptions::from(config.clone()))
    }

    /// Hand an event to the sink
    ///
    /// Never fails and never panics. Only waits when the queue is bounded,
    /// full and configured to block, and then only the calling thread. Events
    /// that cannot be queued are dropped and counted.
    pub fn enqueue(&self, event: LogEvent) {
        let accepted = if self.queue.blocks_when_full() {
            self.queue.enqueue_blocking(event).is_ok()
        } else {
            self.queue.try_enqueue(event).is_ok()
        };

        if accepted {
            self.metrics.record_enqueued();
        } else {
            self.metrics.record_dropped();
        }
    }

    /// Stop accepting events, drain the queue and close the output stream
    ///
    /// Idempotent. Concurrent callers wait until the first one has finished.
    /// Blocks the calling thread while the backlog is written.
    pub fn shutdown(&self) {
        let mut worker = self.worker.lock();
        let Some(handle) = worker.take() else {
            return;
        };

        self.state.store(SinkState::Draining as u8, Ordering::Release);
        self.queue.close();

        match handle.join() {
            Ok(snapshot) => {
                tracing::info!(
                    sink = %self.name,
                    enqueued = snapshot.events_enqueued,
                    written = snapshot.events_written,
                    dropped = snapshot.events_dropped,
                    bytes = snapshot.bytes_written,
                    render_errors = snapshot.render_errors,
                    write_errors = snapshot.write_errors,
                    "console sink shut down"
                );
            }
            Err(payload) => {
                tracing::error!(
                    sink = %self.name,
                    panic = %panic_message(&*payload),
                    "drain worker panicked"
                );
            }
        }

        self.state.store(SinkState::Closed as u8, Ordering::Release);
    }

    /// Current lifecycle state
    pub fn state(&self) -> SinkState {
        SinkState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Live counters
    pub fn metrics(&self) -> &ConsoleSinkMetrics {
        &self.metrics
    }

    /// Sink name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Events accepted but not yet taken by the worker
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl Drop for ConsoleSink {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for ConsoleSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleSink")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("pending", &self.pending())
            .finish()
    }
}
