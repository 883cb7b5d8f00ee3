//! Tests for sink metrics and errors

use crate::{ConfigError, ConsoleSinkMetrics, MetricsSnapshot, SinkError};

#[test]
fn test_metrics_new() {
    let metrics = ConsoleSinkMetrics::new();
    let snapshot = metrics.snapshot();

    assert_eq!(snapshot, MetricsSnapshot::default());
}

#[test]
fn test_metrics_enqueued_and_dropped() {
    let metrics = ConsoleSinkMetrics::new();

    metrics.record_enqueued();
    metrics.record_enqueued();
    metrics.record_dropped();
    metrics.record_dropped_many(3);

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.events_enqueued, 2);
    assert_eq!(snapshot.events_dropped, 4);
}

#[test]
fn test_metrics_written() {
    let metrics = ConsoleSinkMetrics::new();

    metrics.record_written_many(1, 120);
    metrics.record_written_many(2, 80);

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.events_written, 3);
    assert_eq!(snapshot.bytes_written, 200);
}

#[test]
fn test_metrics_errors_and_flushes() {
    let metrics = ConsoleSinkMetrics::new();

    metrics.record_render_error();
    metrics.record_write_error();
    metrics.record_write_error();
    metrics.record_flush();

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.render_errors, 1);
    assert_eq!(snapshot.write_errors, 2);
    assert_eq!(snapshot.flush_count, 1);
}

#[test]
fn test_snapshot_equality() {
    let s1 = MetricsSnapshot {
        events_enqueued: 10,
        events_written: 10,
        ..Default::default()
    };
    let s2 = s1;
    let s3 = MetricsSnapshot {
        events_dropped: 1,
        ..s1
    };

    assert_eq!(s1, s2);
    assert_ne!(s1, s3);
}

#[test]
fn test_error_display() {
    let err = SinkError::init("no thread");
    assert!(err.to_string().contains("failed to initialize sink"));
    assert!(err.to_string().contains("no thread"));

    let err = SinkError::from(std::io::Error::other("broken pipe"));
    assert!(err.to_string().contains("broken pipe"));

    let err = SinkError::from(ConfigError::invalid_value("buffer_size", "must be > 0"));
    assert!(err.to_string().contains("configuration error"));
    assert!(err.to_string().contains("buffer_size"));
}
