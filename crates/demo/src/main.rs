//! fastlog demo - burst load generator for the console sink
//!
//! Spawns producer threads that fire bursts of structured events at a
//! `ConsoleSink` writing to stdout, then shuts the sink down and reports the
//! final counters on stderr.
//!
//! # Usage
//!
//! ```bash
//! # 5 producers x 1000 JSON lines, unbounded queue
//! fastlog-demo
//!
//! # Bounded queue that drops under pressure
//! fastlog-demo --queue-limit 100 > /dev/null
//!
//! # Bounded queue that blocks producers, colored output template
//! fastlog-demo --queue-limit 100 --block --text --template "[{Level:u3}] {Message}{NewLine}" --color
//!
//! # Options from a TOML file
//! fastlog-demo --config sink.toml
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use fastlog_sink::{ConsoleSink, ConsoleSinkConfig, ConsoleSinkOptions, LogEvent, LogLevel};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Burst load generator for the fastlog console sink
#[derive(Parser, Debug)]
#[command(name = "fastlog-demo")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Sink configuration file (TOML); flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of producer threads
    #[arg(short, long, default_value_t = 5)]
    producers: usize,

    /// Events per producer
    #[arg(short, long, default_value_t = 1000)]
    events: usize,

    /// Bound the queue to this many events
    #[arg(short, long)]
    queue_limit: Option<usize>,

    /// Block producers instead of dropping when the queue is full
    #[arg(long)]
    block: bool,

    /// Plain text output instead of JSON
    #[arg(long)]
    text: bool,

    /// Output template for text mode
    #[arg(long)]
    template: Option<String>,

    /// Color the level token in output templates
    #[arg(long)]
    color: bool,

    /// Payload characters per event
    #[arg(long, default_value_t = 100)]
    payload_size: usize,

    /// Diagnostic log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let options = build_options(&cli)?;
    let sink = Arc::new(ConsoleSink::new(options).context("failed to start console sink")?);

    let started = Instant::now();
    let handles: Vec<_> = (0..cli.producers)
        .map(|producer| {
            let sink = Arc::clone(&sink);
            let events = cli.events;
            let payload = "x".repeat(cli.payload_size);
            thread::Builder::new()
                .name(format!("producer-{producer}"))
                .spawn(move || fire_burst(&sink, producer, events, &payload))
                .context("failed to spawn producer thread")
        })
        .collect::<Result<_>>()?;

    for handle in handles {
        if handle.join().is_err() {
            tracing::error!("producer thread panicked");
        }
    }
    let produced_in = started.elapsed();

    sink.shutdown();
    let total = started.elapsed();

    let snapshot = sink.metrics().snapshot();
    tracing::info!(
        producers = cli.producers,
        enqueued = snapshot.events_enqueued,
        written = snapshot.events_written,
        dropped = snapshot.events_dropped,
        bytes = snapshot.bytes_written,
        flushes = snapshot.flush_count,
        produce_ms = produced_in.as_millis() as u64,
        total_ms = total.as_millis() as u64,
        "burst complete"
    );

    Ok(())
}

fn fire_burst(sink: &ConsoleSink, producer: usize, events: usize, payload: &str) {
    for index in 0..events {
        let level = match index % 100 {
            0 => LogLevel::Warning,
            50 => LogLevel::Debug,
            _ => LogLevel::Information,
        };
        sink.enqueue(
            LogEvent::new(level, "burst {Producer} event {Index}: {Payload}")
                .with_property("Producer", producer)
                .with_property("Index", index)
                .with_property("Payload", payload),
        );
    }
}

/// Config file (if any) first, then command-line overrides
fn build_options(cli: &Cli) -> Result<ConsoleSinkOptions> {
    let mut options = match &cli.config {
        Some(path) => ConsoleSinkConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?
            .into(),
        None => ConsoleSinkOptions::default(),
    };

    if let Some(limit) = cli.queue_limit {
        options = options.with_queue_limit(limit);
    }
    if cli.block {
        options = options.block_when_full();
    }
    if cli.text {
        options = options.text();
    }
    if let Some(template) = &cli.template {
        options = options.with_output_template(template);
    }
    if cli.color {
        options = options.with_color(true);
    }

    Ok(options)
}

/// Initialize the tracing subscriber; diagnostics go to stderr
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}
