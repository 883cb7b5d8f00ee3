//! Drain worker
//!
//! The single consumer of a sink's queue. It owns the output stream and the
//! scratch buffer, so neither needs a lock.
//!
//! # Loop
//!
//! 1. Await the next event
//! 2. Render it into the scratch buffer (failures skip the event)
//! 3. Write the buffer to the stream
//! 4. Flush once the queue runs dry; flushed events count as written
//!
//! When the queue is closed and drained the stream is flushed and shut down
//! exactly once. A failed write or flush ends the worker early: the queue is
//! closed, everything still queued or unflushed is counted as dropped, and the
//! stream is left alone.
//!
//! The worker runs on its own thread with a current-thread runtime (see
//! [`DrainWorker::spawn`]), so a synchronous `shutdown()` can join it from
//! anywhere, including from inside another runtime.

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use bytes::BytesMut;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

use crate::common::{ConsoleSinkMetrics, MetricsSnapshot, SinkError};
use crate::event::LogEvent;
use crate::queue::EventQueue;
use crate::render::{Formatter, Render, RenderError};
use crate::util::RateLimitedLogger;

/// Initial scratch buffer capacity; grows to fit the largest event seen
const SCRATCH_CAPACITY: usize = 4 * 1024;

/// The single consumer that renders and writes events
pub struct DrainWorker<W> {
    name: String,
    queue: Arc<EventQueue>,
    formatter: Formatter,
    writer: BufWriter<W>,
    metrics: Arc<ConsoleSinkMetrics>,
    render_errors: RateLimitedLogger,
}

impl<W> DrainWorker<W>
where
    W: AsyncWrite + Send + Unpin,
{
    /// Create a worker writing to `writer` through a `buffer_size` write buffer
    pub fn new(
        name: impl Into<String>,
        queue: Arc<EventQueue>,
        formatter: Formatter,
        writer: W,
        buffer_size: usize,
        metrics: Arc<ConsoleSinkMetrics>,
    ) -> Self {
        Self {
            name: name.into(),
            queue,
            formatter,
            writer: BufWriter::with_capacity(buffer_size.max(1), writer),
            metrics,
            render_errors: RateLimitedLogger::default(),
        }
    }

    /// Run until the queue is closed and drained (or the stream fails)
    pub async fn run(mut self) -> MetricsSnapshot {
        tracing::debug!(
            sink = %self.name,
            formatter = self.formatter.kind(),
            "drain worker starting"
        );

        let mut scratch = BytesMut::with_capacity(SCRATCH_CAPACITY);
        // Events in the write buffer are counted as written once flushed
        let mut pending = Pending::default();
        let mut failed = false;

        while let Some(event) = self.queue.recv().await {
            scratch.clear();

            if self.render(&event, &mut scratch) {
                if let Err(e) = self.writer.write_all(&scratch).await {
                    // The event in hand is lost along with the rest
                    self.metrics.record_dropped_many(pending.events + 1);
                    self.fail("write", &e);
                    failed = true;
                    break;
                }
                pending.push(scratch.len());
            }

            if pending.events > 0 && self.queue.is_empty() {
                if let Err(e) = self.writer.flush().await {
                    self.metrics.record_dropped_many(pending.events);
                    self.fail("flush", &e);
                    failed = true;
                    break;
                }
                self.metrics.record_flush();
                pending.commit(&self.metrics);
            }
        }

        if !failed {
            self.finish(pending).await;
        }

        let snapshot = self.metrics.snapshot();
        tracing::debug!(
            sink = %self.name,
            written = snapshot.events_written,
            dropped = snapshot.events_dropped,
            bytes = snapshot.bytes_written,
            render_errors = snapshot.render_errors,
            write_errors = snapshot.write_errors,
            "drain worker finished"
        );
        snapshot
    }

    /// Render one event into `buf`; false if it must be skipped
    fn render(&mut self, event: &LogEvent, buf: &mut BytesMut) -> bool {
        let formatter = &self.formatter;
        let result = panic::catch_unwind(AssertUnwindSafe(|| formatter.render(event, buf)))
            .unwrap_or_else(|payload| Err(RenderError::Panicked(panic_message(&*payload))));

        match result {
            Ok(()) => true,
            Err(e) => {
                self.metrics.record_render_error();
                self.render_errors.error("failed to render event", &e);
                false
            }
        }
    }

    /// The output stream is gone: stop accepting and discard the backlog
    fn fail(&self, op: &'static str, error: &io::Error) {
        self.metrics.record_write_error();
        let discarded = self.queue.close_and_discard();
        self.metrics.record_dropped_many(discarded as u64);

        tracing::error!(
            sink = %self.name,
            op,
            error = %error,
            discarded,
            "output stream failed, sink stopped writing"
        );
    }

    /// Final flush and shutdown of the stream
    async fn finish(&mut self, mut pending: Pending) {
        match self.writer.flush().await {
            Ok(()) => {
                self.metrics.record_flush();
                pending.commit(&self.metrics);
            }
            Err(e) => {
                self.metrics.record_write_error();
                self.metrics.record_dropped_many(pending.events);
                tracing::error!(sink = %self.name, error = %e, "final flush failed");
                return;
            }
        }

        if let Err(e) = self.writer.shutdown().await {
            self.metrics.record_write_error();
            tracing::error!(sink = %self.name, error = %e, "failed to close output stream");
        }
    }
}

/// Events written into the buffer since the last successful flush
#[derive(Debug, Default)]
struct Pending {
    events: u64,
    bytes: u64,
}

impl Pending {
    fn push(&mut self, bytes: usize) {
        self.events += 1;
        self.bytes += bytes as u64;
    }

    fn commit(&mut self, metrics: &ConsoleSinkMetrics) {
        if self.events > 0 {
            metrics.record_written_many(self.events, self.bytes);
        }
        *self = Self::default();
    }
}

impl<W> DrainWorker<W>
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    /// Run the worker on a dedicated thread
    ///
    /// The thread is named `<name>-drain` and drives a current-thread tokio
    /// runtime. Joining the handle yields the final metrics.
    pub fn spawn(self) -> Result<JoinHandle<MetricsSnapshot>, SinkError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SinkError::init(format!("failed to build drain runtime: {e}")))?;

        thread::Builder::new()
            .name(format!("{}-drain", self.name))
            .spawn(move || runtime.block_on(self.run()))
            .map_err(|e| SinkError::init(format!("failed to spawn drain thread: {e}")))
    }
}

/// Extract a readable message from a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
