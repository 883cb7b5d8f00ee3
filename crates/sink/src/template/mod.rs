//! Message templates
//!
//! A template is literal text with named holes: `"user {UserId} logged in"`.
//! Parsing happens once, when the event is built; the drain worker only renders.
//!
//! # Syntax
//!
//! - `{Name}` - named property
//! - `{0}` - positional property (looked up by the name `"0"`)
//! - `{@Name}` / `{$Name}` - destructure / stringify capture hints
//! - `{Name,10}` / `{Name,-10}` - right / left aligned to a minimum width (at
//!   most 4096; wider holes stay literal text)
//! - `{Name:j}` - render the value as JSON; `{Name:.2}` - float precision
//! - `{{` / `}}` - literal braces
//!
//! Anything that does not parse as a hole is kept as literal text, so parsing
//! never fails.

mod parser;

use std::fmt::{self, Write as _};

use crate::event::{Properties, PropertyValue, Scalar};

/// Capture hint on a property hole
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Capture {
    #[default]
    Default,
    /// `@` prefix
    ///
    /// Accepted for template compatibility. Property values are already
    /// structured when attached to the event, so it renders like `Default`.
    Destructure,
    /// `$` prefix
    Stringify,
}

/// Minimum width for a rendered hole
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alignment {
    pub width: usize,
    /// Pad on the right instead of the left
    pub left: bool,
}

/// A property hole in a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyToken {
    name: String,
    raw: String,
    capture: Capture,
    format: Option<String>,
    alignment: Option<Alignment>,
}

impl PropertyToken {
    /// Property name (digits for positional holes)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source text of the hole, braces included
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn capture(&self) -> Capture {
        self.capture
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub fn alignment(&self) -> Option<Alignment> {
        self.alignment
    }
}

/// Parsed template element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Text(String),
    Property(PropertyToken),
}

/// A parsed message template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    text: String,
    tokens: Vec<Token>,
}

impl MessageTemplate {
    /// Parse a template
    pub fn parse(text: impl Into<String>) -> Self {
        let text = text.into();
        let tokens = parser::parse(&text);
        Self { text, tokens }
    }

    /// Original template text
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Iterate over the property holes in order of appearance
    pub fn property_tokens(&self) -> impl Iterator<Item = &PropertyToken> {
        self.tokens.iter().filter_map(|token| match token {
            Token::Property(p) => Some(p),
            Token::Text(_) => None,
        })
    }

    /// Render against `properties`
    ///
    /// A hole without a matching property renders its raw source text.
    pub fn render(&self, properties: &Properties, out: &mut impl fmt::Write) -> fmt::Result {
        self.render_with(properties, out, false)
    }

    /// Render into a new string
    pub fn render_to_string(&self, properties: &Properties) -> String {
        let mut out = String::with_capacity(self.text.len() + 16);
        // Writing into a String cannot fail
        let _ = self.render(properties, &mut out);
        out
    }

    /// Lazily rendered message, for use with `Display` consumers
    pub fn display<'a>(&'a self, properties: &'a Properties) -> RenderedMessage<'a> {
        RenderedMessage {
            template: self,
            properties,
            json: false,
        }
    }

    /// Like [`display`](Self::display), with every value rendered as JSON
    pub fn display_json<'a>(&'a self, properties: &'a Properties) -> RenderedMessage<'a> {
        RenderedMessage {
            template: self,
            properties,
            json: true,
        }
    }

    fn render_with(
        &self,
        properties: &Properties,
        out: &mut impl fmt::Write,
        json: bool,
    ) -> fmt::Result {
        for token in &self.tokens {
            match token {
                Token::Text(text) => out.write_str(text)?,
                Token::Property(hole) => match properties.get(&hole.name) {
                    Some(value) => render_hole(hole, value, out, json)?,
                    None => out.write_str(&hole.raw)?,
                },
            }
        }
        Ok(())
    }
}

impl From<&str> for MessageTemplate {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

impl From<String> for MessageTemplate {
    fn from(text: String) -> Self {
        Self::parse(text)
    }
}

impl From<&String> for MessageTemplate {
    fn from(text: &String) -> Self {
        Self::parse(text.as_str())
    }
}

impl fmt::Display for MessageTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A template bound to its properties; renders on `Display`
#[derive(Debug, Clone, Copy)]
pub struct RenderedMessage<'a> {
    template: &'a MessageTemplate,
    properties: &'a Properties,
    json: bool,
}

impl fmt::Display for RenderedMessage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.template.render_with(self.properties, f, self.json)
    }
}

// =============================================================================
// Value rendering
// =============================================================================

/// Render a single hole against `properties` (raw text when missing)
pub(crate) fn render_property(
    hole: &PropertyToken,
    properties: &Properties,
    out: &mut impl fmt::Write,
) -> fmt::Result {
    match properties.get(&hole.name) {
        Some(value) => render_hole(hole, value, out, false),
        None => out.write_str(&hole.raw),
    }
}

fn render_hole(
    hole: &PropertyToken,
    value: &PropertyValue,
    out: &mut impl fmt::Write,
    json: bool,
) -> fmt::Result {
    let Some(alignment) = hole.alignment else {
        return write_hole_value(hole, value, out, json);
    };

    let mut text = String::new();
    write_hole_value(hole, value, &mut text, json)?;
    write_aligned(out, &text, Some(alignment))
}

fn write_hole_value(
    hole: &PropertyToken,
    value: &PropertyValue,
    out: &mut impl fmt::Write,
    json: bool,
) -> fmt::Result {
    let format = hole.format.as_deref();

    if json || format == Some("j") {
        return write_json(value, out);
    }

    if hole.capture == Capture::Stringify {
        let mut text = String::new();
        write_value(value, format, &mut text, false)?;
        out.write_char('"')?;
        write_escaped(&text, out)?;
        return out.write_char('"');
    }

    write_value(value, format, out, false)
}

fn write_json(value: &PropertyValue, out: &mut impl fmt::Write) -> fmt::Result {
    let json = serde_json::to_string(value).map_err(|_| fmt::Error)?;
    out.write_str(&json)
}

fn write_value(
    value: &PropertyValue,
    format: Option<&str>,
    out: &mut impl fmt::Write,
    nested: bool,
) -> fmt::Result {
    match value {
        PropertyValue::Scalar(scalar) => write_scalar(scalar, format, out, nested),
        PropertyValue::Sequence(items) => {
            out.write_char('[')?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.write_str(", ")?;
                }
                write_value(item, format, out, true)?;
            }
            out.write_char(']')
        }
        PropertyValue::Structure {
            type_tag,
            properties,
        } => {
            if let Some(tag) = type_tag {
                out.write_str(tag)?;
                out.write_char(' ')?;
            }
            if properties.is_empty() {
                return out.write_str("{}");
            }
            out.write_str("{ ")?;
            for (i, (name, item)) in properties.iter().enumerate() {
                if i > 0 {
                    out.write_str(", ")?;
                }
                write!(out, "{name}: ")?;
                write_value(item, format, out, true)?;
            }
            out.write_str(" }")
        }
    }
}

fn write_scalar(
    scalar: &Scalar,
    format: Option<&str>,
    out: &mut impl fmt::Write,
    nested: bool,
) -> fmt::Result {
    match scalar {
        Scalar::Str(s) if nested => {
            out.write_char('"')?;
            write_escaped(s, out)?;
            out.write_char('"')
        }
        Scalar::Float(x) => match float_precision(format) {
            Some(precision) => write!(out, "{x:.precision$}"),
            None => write!(out, "{x}"),
        },
        other => write!(out, "{other}"),
    }
}

/// Parse a `.N` precision format
fn float_precision(format: Option<&str>) -> Option<usize> {
    format?.strip_prefix('.')?.parse().ok()
}

fn write_escaped(s: &str, out: &mut impl fmt::Write) -> fmt::Result {
    for c in s.chars() {
        match c {
            '"' => out.write_str("\\\"")?,
            '\\' => out.write_str("\\\\")?,
            c => out.write_char(c)?,
        }
    }
    Ok(())
}

/// Write `text`, padded with spaces to the alignment width
pub(crate) fn write_aligned(
    out: &mut impl fmt::Write,
    text: &str,
    alignment: Option<Alignment>,
) -> fmt::Result {
    let Some(Alignment { width, left }) = alignment else {
        return out.write_str(text);
    };

    let pad = width.saturating_sub(text.chars().count());
    if left {
        out.write_str(text)?;
    }
    for _ in 0..pad {
        out.write_char(' ')?;
    }
    if !left {
        out.write_str(text)?;
    }
    Ok(())
}
