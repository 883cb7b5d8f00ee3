//! Output template renderer
//!
//! Lays out text-mode lines with event-level tokens:
//!
//! ```text
//! [{Timestamp:%H:%M:%S} {Level:u3}] {Message}{NewLine}{Exception}
//! ```
//!
//! | Token         | Output                                                  |
//! |---------------|---------------------------------------------------------|
//! | `{Timestamp}` | event time, chrono strftime format after `:`            |
//! | `{Level}`     | level name; `:u3` `INF`, `:w3` `inf`, `:u` `INFORMATION`, `:w` `information` |
//! | `{Message}`   | rendered message; `:j` renders values as JSON           |
//! | `{Exception}` | exception text plus newline, empty when absent          |
//! | `{Properties}`| all event properties as a JSON object                   |
//! | `{NewLine}`   | `\n`                                                    |
//! | anything else | the event property with that name                       |
//!
//! Every token accepts an alignment (`{Level,-11}`).

use std::fmt::{self, Write};

use bytes::{BufMut, BytesMut};
use chrono::format::{Item, StrftimeItems};
use owo_colors::{OwoColorize, Style};

use super::{Render, RenderError};
use crate::event::{LogEvent, LogLevel};
use crate::template::{self, Alignment, MessageTemplate, PropertyToken, Token};

const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f %:z";

/// Level token rendering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LevelFormat {
    /// `Information`
    #[default]
    Name,
    /// `INF`
    UpperShort,
    /// `inf`
    LowerShort,
    /// `INFORMATION`
    Upper,
    /// `information`
    Lower,
}

impl LevelFormat {
    fn parse(format: Option<&str>) -> Self {
        match format {
            Some("u3") => Self::UpperShort,
            Some("w3") => Self::LowerShort,
            Some("u") => Self::Upper,
            Some("w") => Self::Lower,
            _ => Self::Name,
        }
    }

    fn apply(self, level: LogLevel, out: &mut String) {
        match self {
            Self::Name => out.push_str(level.name()),
            Self::UpperShort => out.push_str(level.short_name()),
            Self::LowerShort => out.push_str(&level.short_name().to_ascii_lowercase()),
            Self::Upper => out.push_str(level.as_str()),
            Self::Lower => out.push_str(&level.as_str().to_ascii_lowercase()),
        }
    }
}

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Timestamp {
        format: String,
        alignment: Option<Alignment>,
    },
    Level {
        format: LevelFormat,
        alignment: Option<Alignment>,
    },
    Message {
        json: bool,
        alignment: Option<Alignment>,
    },
    Exception,
    Properties,
    NewLine,
    Property(PropertyToken),
}

/// Text renderer driven by an output template
#[derive(Debug, Clone)]
pub struct OutputTemplate {
    text: String,
    segments: Vec<Segment>,
    color: bool,
}

impl OutputTemplate {
    /// The layout used when none is configured
    pub const DEFAULT: &'static str =
        "[{Timestamp:%H:%M:%S} {Level:u3}] {Message}{NewLine}{Exception}";

    /// Parse an output template
    ///
    /// An invalid timestamp format falls back to the default one.
    pub fn new(text: &str, color: bool) -> Self {
        let parsed = MessageTemplate::parse(text);
        let segments = parsed
            .tokens()
            .iter()
            .map(|token| match token {
                Token::Text(literal) => Segment::Literal(literal.clone()),
                Token::Property(hole) => segment_for(hole),
            })
            .collect();

        Self {
            text: text.to_string(),
            segments,
            color,
        }
    }

    /// Template source text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the level token is colored
    pub fn color(&self) -> bool {
        self.color
    }

    fn write_level(
        &self,
        level: LogLevel,
        format: LevelFormat,
        alignment: Option<Alignment>,
        scratch: &mut String,
        buf: &mut BytesMut,
    ) -> fmt::Result {
        scratch.clear();
        format.apply(level, scratch);

        if !self.color {
            return template::write_aligned(buf, scratch, alignment);
        }

        let mut padded = String::with_capacity(scratch.len() + 8);
        template::write_aligned(&mut padded, scratch, alignment)?;
        write!(buf, "{}", padded.style(level_style(level)))
    }
}

impl Default for OutputTemplate {
    fn default() -> Self {
        Self::new(Self::DEFAULT, false)
    }
}

fn segment_for(hole: &PropertyToken) -> Segment {
    let alignment = hole.alignment();
    match hole.name() {
        "Timestamp" => Segment::Timestamp {
            format: timestamp_format(hole.format()),
            alignment,
        },
        "Level" => Segment::Level {
            format: LevelFormat::parse(hole.format()),
            alignment,
        },
        "Message" => Segment::Message {
            json: hole.format() == Some("j"),
            alignment,
        },
        "Exception" => Segment::Exception,
        "Properties" => Segment::Properties,
        "NewLine" => Segment::NewLine,
        _ => Segment::Property(hole.clone()),
    }
}

fn timestamp_format(format: Option<&str>) -> String {
    match format {
        Some(f) if StrftimeItems::new(f).any(|item| matches!(item, Item::Error)) => {
            tracing::warn!(
                format = f,
                "invalid timestamp format in output template, using default"
            );
            DEFAULT_TIMESTAMP_FORMAT.to_string()
        }
        Some(f) => f.to_string(),
        None => DEFAULT_TIMESTAMP_FORMAT.to_string(),
    }
}

/// Get style for log level
fn level_style(level: LogLevel) -> Style {
    match level {
        LogLevel::Fatal | LogLevel::Error => Style::new().red(),
        LogLevel::Warning => Style::new().yellow(),
        LogLevel::Information | LogLevel::Debug => Style::new(),
        LogLevel::Verbose => Style::new().dimmed(),
    }
}

impl Render for OutputTemplate {
    fn render(&self, event: &LogEvent, buf: &mut BytesMut) -> Result<(), RenderError> {
        let mut scratch = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => buf.put_slice(text.as_bytes()),
                Segment::NewLine => buf.put_u8(b'\n'),
                Segment::Timestamp { format, alignment } => {
                    scratch.clear();
                    write!(scratch, "{}", event.timestamp().format(format))?;
                    template::write_aligned(buf, &scratch, *alignment)?;
                }
                Segment::Level { format, alignment } => {
                    self.write_level(event.level(), *format, *alignment, &mut scratch, buf)?;
                }
                Segment::Message { json, alignment } => {
                    let message = event.message_template();
                    let rendered = if *json {
                        message.display_json(event.properties())
                    } else {
                        message.display(event.properties())
                    };
                    if alignment.is_some() {
                        scratch.clear();
                        write!(scratch, "{rendered}")?;
                        template::write_aligned(buf, &scratch, *alignment)?;
                    } else {
                        write!(buf, "{rendered}")?;
                    }
                }
                Segment::Exception => {
                    if let Some(exception) = event.exception() {
                        buf.put_slice(exception.as_bytes());
                        if !exception.ends_with('\n') {
                            buf.put_u8(b'\n');
                        }
                    }
                }
                Segment::Properties => {
                    serde_json::to_writer((&mut *buf).writer(), event.properties())?;
                }
                Segment::Property(hole) => {
                    template::render_property(hole, event.properties(), buf)?;
                }
            }
        }
        Ok(())
    }
}
