//! Rate-limited error logging
//!
//! Logs at most once per interval and reports how many errors were suppressed
//! in between. Owned by the drain worker, so no synchronization is needed.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use fastlog_sink::util::RateLimitedLogger;
//!
//! let mut logger = RateLimitedLogger::new(Duration::from_secs(10));
//! let error = std::io::Error::other("bad template");
//!
//! assert!(logger.error("render failed", &error));
//! assert!(!logger.error("render failed", &error));
//! assert_eq!(logger.suppressed_count(), 1);
//! ```

use std::fmt::Display;
use std::time::{Duration, Instant};

/// Default interval between logged errors
pub const DEFAULT_LOG_INTERVAL: Duration = Duration::from_secs(10);

/// Error logger that emits at most one record per interval
#[derive(Debug)]
pub struct RateLimitedLogger {
    /// Minimum interval between log records
    min_interval: Duration,

    /// When the last record was emitted
    last_logged: Option<Instant>,

    /// Errors since the last record
    suppressed: u64,

    /// Errors ever recorded
    total: u64,
}

impl RateLimitedLogger {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_logged: None,
            suppressed: 0,
            total: 0,
        }
    }

    /// Record an error, logging it if the interval has passed
    ///
    /// Returns true if a record was emitted.
    pub fn error(&mut self, message: &str, error: &dyn Display) -> bool {
        self.total += 1;

        let now = Instant::now();
        let due = self
            .last_logged
            .is_none_or(|last| now.duration_since(last) >= self.min_interval);

        if !due {
            self.suppressed += 1;
            return false;
        }

        self.last_logged = Some(now);
        let suppressed = std::mem::take(&mut self.suppressed);
        if suppressed > 0 {
            tracing::error!(
                error = %error,
                suppressed_count = suppressed,
                total_errors = self.total,
                "{message} (rate-limited)"
            );
        } else {
            tracing::error!(error = %error, total_errors = self.total, "{message}");
        }
        true
    }

    /// Errors recorded but not logged since the last record
    pub fn suppressed_count(&self) -> u64 {
        self.suppressed
    }

    /// Errors ever recorded
    pub fn total_count(&self) -> u64 {
        self.total
    }
}

impl Default for RateLimitedLogger {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_INTERVAL)
    }
}
