//! End-to-end tests driving the sink from many producer threads

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::thread;
use std::time::{Duration, Instant};

use fastlog_sink::{
    CaptureWriter, ConsoleSink, ConsoleSinkConfig, ConsoleSinkOptions, FnFormatter, LogEvent,
    LogLevel, Properties, PropertyValue, RenderError, SinkState,
};
use serde_json::Value;
use tokio::io::AsyncWrite;

fn spawn_producers(
    sink: &Arc<ConsoleSink>,
    producers: usize,
    per_producer: usize,
) -> Vec<thread::JoinHandle<()>> {
    (0..producers)
        .map(|p| {
            let sink = Arc::clone(sink);
            thread::spawn(move || {
                for i in 0..per_producer {
                    sink.enqueue(
                        LogEvent::new(LogLevel::Information, "producer {producer} event {index}")
                            .with_property("producer", p)
                            .with_property("index", i),
                    );
                }
            })
        })
        .collect()
}

fn index_of(line: &Value, key: &str) -> u64 {
    line["properties"][key].as_u64().unwrap()
}

#[test]
fn test_many_producers_unbounded_json() {
    const PRODUCERS: usize = 50;
    const PER_PRODUCER: usize = 100;

    let capture = CaptureWriter::new();
    let sink = Arc::new(
        ConsoleSink::with_writer(ConsoleSinkOptions::default(), capture.clone()).unwrap(),
    );

    for handle in spawn_producers(&sink, PRODUCERS, PER_PRODUCER) {
        handle.join().unwrap();
    }
    sink.shutdown();

    let lines = capture.lines();
    assert_eq!(lines.len(), PRODUCERS * PER_PRODUCER);

    let mut last_index = vec![None::<u64>; PRODUCERS];
    for line in &lines {
        let value: Value = serde_json::from_str(line).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        // serde_json's default map sorts keys, so check order on the raw text
        assert_eq!(keys.len(), 4);
        let positions: Vec<_> = ["\"timestamp\"", "\"level\"", "\"message\"", "\"properties\""]
            .iter()
            .map(|k| line.find(k).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(value["level"], "INFORMATION");

        // Per-producer FIFO
        let producer = index_of(&value, "producer") as usize;
        let index = index_of(&value, "index");
        assert!(last_index[producer].is_none_or(|prev| prev < index));
        last_index[producer] = Some(index);
    }

    let snapshot = sink.metrics().snapshot();
    assert_eq!(snapshot.events_enqueued, 5000);
    assert_eq!(snapshot.events_written, 5000);
    assert_eq!(snapshot.events_dropped, 0);
    assert_eq!(capture.shutdown_count(), 1);
}

#[test]
fn test_block_mode_delivers_everything() {
    let capture = CaptureWriter::new();
    let sink = Arc::new(
        ConsoleSink::with_writer(
            ConsoleSinkOptions::default()
                .text()
                .with_queue_limit(8)
                .block_when_full(),
            capture.clone(),
        )
        .unwrap(),
    );

    for handle in spawn_producers(&sink, 4, 500) {
        handle.join().unwrap();
    }
    sink.shutdown();

    assert_eq!(capture.line_count(), 2000);
    let snapshot = sink.metrics().snapshot();
    assert_eq!(snapshot.events_written, 2000);
    assert_eq!(snapshot.events_dropped, 0);
}

#[test]
fn test_drop_mode_accounts_for_every_event() {
    let capture = CaptureWriter::new();
    let sink = Arc::new(
        ConsoleSink::with_writer(
            ConsoleSinkOptions::default().with_queue_limit(4),
            capture.clone(),
        )
        .unwrap(),
    );

    for handle in spawn_producers(&sink, 8, 250) {
        handle.join().unwrap();
    }
    sink.shutdown();

    let snapshot = sink.metrics().snapshot();
    assert_eq!(snapshot.events_enqueued + snapshot.events_dropped, 2000);
    assert_eq!(snapshot.events_written, snapshot.events_enqueued);
    assert_eq!(capture.line_count() as u64, snapshot.events_written);
}

#[test]
fn test_text_mode_hello_world() {
    let capture = CaptureWriter::new();
    let sink =
        ConsoleSink::with_writer(ConsoleSinkOptions::default().text(), capture.clone()).unwrap();

    sink.enqueue(
        LogEvent::new(LogLevel::Information, "hello {name}").with_property("name", "world"),
    );
    sink.shutdown();

    assert_eq!(capture.contents(), "hello world\n");
}

#[test]
fn test_json_exception_and_structure() {
    let capture = CaptureWriter::new();
    let sink = ConsoleSink::with_writer(ConsoleSinkOptions::default(), capture.clone()).unwrap();

    let request = PropertyValue::structure(
        Some("Request"),
        Properties::new().with("path", "/health").with("status", 503),
    );
    sink.enqueue(
        LogEvent::new(LogLevel::Error, "request failed {@req}")
            .with_property("req", request)
            .with_exception("timeout\n  at poll"),
    );
    sink.shutdown();

    let line = capture.lines().pop().unwrap();
    let value: Value = serde_json::from_str(&line).unwrap();
    assert_eq!(value["level"], "ERROR");
    assert_eq!(
        value["message"],
        "request failed Request { path: \"/health\", status: 503 }"
    );
    assert_eq!(value["exception"], "timeout\n  at poll");
    assert_eq!(value["properties"]["req"]["_typeTag"], "Request");
    assert!(line.find("\"exception\"").unwrap() < line.find("\"properties\"").unwrap());
}

#[test]
fn test_output_template_mode() {
    let capture = CaptureWriter::new();
    let sink = ConsoleSink::with_writer(
        ConsoleSinkOptions::default()
            .text()
            .with_output_template("{Level:u3} {Message} ({user}){NewLine}{Exception}"),
        capture.clone(),
    )
    .unwrap();

    sink.enqueue(
        LogEvent::new(LogLevel::Warning, "quota at {pct}%")
            .with_property("pct", 95)
            .with_property("user", "ada"),
    );
    sink.enqueue(LogEvent::new(LogLevel::Fatal, "crashed").with_exception("panic at main"));
    sink.shutdown();

    assert_eq!(
        capture.contents(),
        "WRN quota at 95% (ada)\nFTL crashed ({user})\npanic at main\n"
    );
}

#[test]
fn test_custom_formatter_failure_does_not_lose_others() {
    let formatter = FnFormatter::new(|event: &LogEvent, buf: &mut bytes::BytesMut| {
        if event.level() == LogLevel::Debug {
            return Err(RenderError::custom("debug not allowed"));
        }
        if event.level() == LogLevel::Verbose {
            panic!("verbose not allowed");
        }
        use std::fmt::Write;
        writeln!(buf, "{}|{}", event.level().short_name(), event.render_message())?;
        Ok(())
    });

    let capture = CaptureWriter::new();
    let sink = ConsoleSink::with_writer(
        ConsoleSinkOptions::default().with_formatter(Arc::new(formatter)),
        capture.clone(),
    )
    .unwrap();

    sink.enqueue(LogEvent::new(LogLevel::Information, "a"));
    sink.enqueue(LogEvent::new(LogLevel::Debug, "b"));
    sink.enqueue(LogEvent::new(LogLevel::Verbose, "c"));
    sink.enqueue(LogEvent::new(LogLevel::Warning, "d"));
    sink.shutdown();

    assert_eq!(capture.lines(), ["INF|a", "WRN|d"]);
    assert_eq!(sink.metrics().snapshot().render_errors, 2);
}

/// Stream that fails every write
struct ClosedStdout;

impl AsyncWrite for ClosedStdout {
    fn poll_write(self: Pin<&mut Self>, _: &mut Context<'_>, _: &[u8]) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed")))
    }

    fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed")))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

#[test]
fn test_failing_stream_does_not_hang() {
    let sink = Arc::new(
        ConsoleSink::with_writer(
            ConsoleSinkOptions::default()
                .with_queue_limit(2)
                .block_when_full()
                .with_buffer_size(1),
            ClosedStdout,
        )
        .unwrap(),
    );

    // Producers in block mode must be released once the worker gives up
    let producers = spawn_producers(&sink, 4, 50);
    for handle in producers {
        handle.join().unwrap();
    }

    let start = Instant::now();
    sink.shutdown();
    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(sink.state(), SinkState::Closed);

    let snapshot = sink.metrics().snapshot();
    assert_eq!(snapshot.events_written, 0);
    assert_eq!(snapshot.write_errors, 1);
    assert_eq!(snapshot.events_dropped, 200);
}

#[test]
fn test_shutdown_twice_is_noop() {
    let capture = CaptureWriter::new();
    let sink = ConsoleSink::with_writer(ConsoleSinkOptions::default(), capture.clone()).unwrap();
    sink.enqueue(LogEvent::new(LogLevel::Information, "x"));

    sink.shutdown();
    let after_first = capture.bytes();
    sink.shutdown();

    assert_eq!(capture.bytes(), after_first);
    assert_eq!(capture.line_count(), 1);
    assert_eq!(capture.shutdown_count(), 1);
}

#[test]
fn test_shutdown_inside_async_context() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();

    let capture = CaptureWriter::new();
    let out = capture.clone();
    runtime.block_on(async move {
        let sink = ConsoleSink::with_writer(ConsoleSinkOptions::default().text(), out).unwrap();
        sink.enqueue(LogEvent::new(LogLevel::Information, "from async"));
        sink.shutdown();
    });

    assert_eq!(capture.contents(), "from async\n");
}

#[test]
fn test_sink_from_config_options() {
    let config: ConsoleSinkConfig = r#"
name = "configured"
queue_limit = 100
use_json = false
output_template = "{Level:w3}: {Message}{NewLine}"
"#
    .parse()
    .unwrap();

    let capture = CaptureWriter::new();
    let sink = ConsoleSink::with_writer(config.into(), capture.clone()).unwrap();
    assert_eq!(sink.name(), "configured");

    sink.enqueue(LogEvent::new(LogLevel::Error, "bad {thing}").with_property("thing", "news"));
    sink.shutdown();

    assert_eq!(capture.contents(), "err: bad news\n");
}

#[test]
fn test_zero_queue_limit_both_policies() {
    for block in [false, true] {
        let capture = CaptureWriter::new();
        let mut options = ConsoleSinkOptions::default().text().with_queue_limit(0);
        if block {
            options = options.block_when_full();
        }
        let sink = Arc::new(ConsoleSink::with_writer(options, capture.clone()).unwrap());

        for handle in spawn_producers(&sink, 4, 100) {
            handle.join().unwrap();
        }
        sink.shutdown();

        let snapshot = sink.metrics().snapshot();
        assert_eq!(capture.line_count() as u64, snapshot.events_written);
        assert_eq!(snapshot.events_written + snapshot.events_dropped, 400);
        if block {
            assert_eq!(snapshot.events_written, 400);
        }
    }
}
