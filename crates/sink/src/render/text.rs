//! Plain text renderer: the rendered message, one per line

use std::fmt::Write;

use bytes::BytesMut;

use super::{Render, RenderError};
use crate::event::LogEvent;

#[derive(Debug, Clone, Copy, Default)]
pub struct TextFormatter;

impl Render for TextFormatter {
    fn render(&self, event: &LogEvent, buf: &mut BytesMut) -> Result<(), RenderError> {
        writeln!(buf, "{}", event.message_template().display(event.properties()))?;
        Ok(())
    }
}
