//! Template parser

use super::{Alignment, Capture, PropertyToken, Token};

/// Widest alignment a hole may request; wider holes stay literal text
pub(super) const MAX_ALIGNMENT_WIDTH: usize = 4096;

/// Split template text into literal and property tokens
pub(super) fn parse(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut rest = text;

    while let Some(i) = rest.find(['{', '}']) {
        literal.push_str(&rest[..i]);
        let tail = &rest[i..];

        if let Some(after) = tail.strip_prefix("{{") {
            literal.push('{');
            rest = after;
            continue;
        }
        if let Some(after) = tail.strip_prefix('}') {
            // `}}` and a lone `}` both render as a single brace
            literal.push('}');
            rest = after.strip_prefix('}').unwrap_or(after);
            continue;
        }

        let body = &tail[1..];
        match body.find(['{', '}']) {
            Some(end) if body.as_bytes()[end] == b'}' => {
                let raw = &tail[..end + 2];
                match parse_hole(&body[..end], raw) {
                    Some(hole) => {
                        if !literal.is_empty() {
                            tokens.push(Token::Text(std::mem::take(&mut literal)));
                        }
                        tokens.push(Token::Property(hole));
                    }
                    None => literal.push_str(raw),
                }
                rest = &body[end + 1..];
            }
            // Unclosed, or another hole opens first
            _ => {
                literal.push('{');
                rest = body;
            }
        }
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        tokens.push(Token::Text(literal));
    }
    tokens
}

/// Parse the inside of `{...}`; `None` if it is not a valid hole
fn parse_hole(content: &str, raw: &str) -> Option<PropertyToken> {
    let (capture, content) = match content.as_bytes().first() {
        Some(b'@') => (Capture::Destructure, &content[1..]),
        Some(b'$') => (Capture::Stringify, &content[1..]),
        _ => (Capture::Default, content),
    };

    let (head, format) = match content.split_once(':') {
        Some((_, "")) => return None,
        Some((head, format)) => (head, Some(format.to_string())),
        None => (content, None),
    };

    let (name, alignment) = match head.split_once(',') {
        Some((name, alignment)) => (name, Some(parse_alignment(alignment)?)),
        None => (head, None),
    };

    if !is_valid_name(name) {
        return None;
    }

    Some(PropertyToken {
        name: name.to_string(),
        raw: raw.to_string(),
        capture,
        format,
        alignment,
    })
}

fn parse_alignment(text: &str) -> Option<Alignment> {
    let (left, digits) = match text.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, text),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let width = digits.parse::<usize>().ok().filter(|&w| w <= MAX_ALIGNMENT_WIDTH)?;
    Some(Alignment { width, left })
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}
