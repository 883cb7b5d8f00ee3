//! JSON line renderer
//!
//! ```text
//! {"timestamp":"2024-05-01T12:00:00.000000000Z","level":"INFORMATION","message":"hello world","properties":{"name":"world"}}
//! ```
//!
//! Key order is fixed: `timestamp`, `level`, `message`, `exception` (only when
//! present), `properties` (only when non-empty).

use std::fmt;

use bytes::{BufMut, BytesMut};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use super::{Render, RenderError};
use crate::event::{LogEvent, Properties};
use crate::template::RenderedMessage;

/// RFC 3339, nanosecond precision, `Z` suffix
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9fZ";

/// Renders each event as one compact JSON object per line
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

#[derive(Serialize)]
struct JsonLine<'a> {
    #[serde(serialize_with = "serialize_timestamp")]
    timestamp: DateTime<Utc>,
    level: &'static str,
    #[serde(serialize_with = "serialize_display")]
    message: RenderedMessage<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exception: Option<&'a str>,
    #[serde(skip_serializing_if = "no_properties")]
    properties: &'a Properties,
}

fn no_properties(properties: &&Properties) -> bool {
    properties.is_empty()
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&ts.format(TIMESTAMP_FORMAT))
}

fn serialize_display<T: fmt::Display, S: Serializer>(value: &T, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(value)
}

impl Render for JsonFormatter {
    fn render(&self, event: &LogEvent, buf: &mut BytesMut) -> Result<(), RenderError> {
        let line = JsonLine {
            timestamp: event.timestamp(),
            level: event.level().as_str(),
            message: event.message_template().display(event.properties()),
            exception: event.exception(),
            properties: event.properties(),
        };

        serde_json::to_writer((&mut *buf).writer(), &line)?;
        buf.put_u8(b'\n');
        Ok(())
    }
}
