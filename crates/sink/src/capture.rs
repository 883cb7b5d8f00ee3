//! In-memory output stream
//!
//! `CaptureWriter` is an `AsyncWrite` that appends into a shared buffer. Clone
//! it before handing it to a sink and read the output back through the clone.
//!
//! ```
//! use fastlog_sink::{CaptureWriter, ConsoleSink, ConsoleSinkOptions, LogEvent, LogLevel};
//!
//! let capture = CaptureWriter::new();
//! let sink = ConsoleSink::with_writer(ConsoleSinkOptions::default().text(), capture.clone())?;
//!
//! sink.enqueue(LogEvent::new(LogLevel::Information, "ready"));
//! sink.shutdown();
//!
//! assert_eq!(capture.contents(), "ready\n");
//! # Ok::<(), fastlog_sink::SinkError>(())
//! ```

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use parking_lot::Mutex;
use tokio::io::AsyncWrite;

#[derive(Debug, Default)]
struct Captured {
    bytes: Vec<u8>,
    flushes: usize,
    shutdowns: usize,
}

/// Shared in-memory output stream
#[derive(Debug, Clone, Default)]
pub struct CaptureWriter {
    inner: Arc<Mutex<Captured>>,
}

impl CaptureWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock().bytes).into_owned()
    }

    /// Raw bytes written so far
    pub fn bytes(&self) -> Vec<u8> {
        self.inner.lock().bytes.clone()
    }

    /// Written output split into lines (without terminators)
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }

    pub fn line_count(&self) -> usize {
        self.inner.lock().bytes.iter().filter(|&&b| b == b'\n').count()
    }

    /// Number of flushes that reached this stream
    pub fn flush_count(&self) -> usize {
        self.inner.lock().flushes
    }

    /// Number of times the stream was shut down
    pub fn shutdown_count(&self) -> usize {
        self.inner.lock().shutdowns
    }
}

impl AsyncWrite for CaptureWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let mut inner = self.inner.lock();
        if inner.shutdowns > 0 {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "write after shutdown",
            )));
        }
        inner.bytes.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.inner.lock().flushes += 1;
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.inner.lock().shutdowns += 1;
        Poll::Ready(Ok(()))
    }
}
