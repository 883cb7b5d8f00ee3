//! Sink utilities
//!
//! - **rate_limited_logger**: keeps repeated render failures from flooding
//!   the diagnostic log

pub mod rate_limited_logger;

pub use rate_limited_logger::{DEFAULT_LOG_INTERVAL, RateLimitedLogger};
