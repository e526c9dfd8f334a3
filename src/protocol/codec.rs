//! protocol::codec
//!
//! Framing and field encoding for the lock wire format.
//!
//! # Format
//!
//! A message is a single line terminated by [`TERMINATOR`] (ETX, `0x03`)
//! rather than a newline, so payloads may carry newlines. Fields are
//! separated by [`DELIMITER`]. Free text that may itself contain the
//! delimiter is embedded as a length-prefixed sub-field:
//!
//! ```text
//! <byteLength>|<bytes>
//! ```
//!
//! Consecutive sub-fields are joined with the delimiter:
//!
//! ```text
//! 7|abc|def|0|
//! ```
//!
//! holds the two fields `abc|def` and the empty string.
//!
//! # Invariants
//!
//! - Decoding never indexes past the end of its input; overruns are errors
//! - Reading a message loops until the accumulated buffer ends with ETX
//! - The terminator is stripped before any decoding happens

use std::io::{self, Read, Write};

use thiserror::Error;

/// Message terminator (ETX).
pub const TERMINATOR: u8 = 0x03;

/// Field delimiter.
pub const DELIMITER: u8 = b'|';

/// Size of each read from the channel.
const READ_CHUNK: usize = 512;

/// Reasons a field-level decode can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("unknown message header '{0}'")]
    UnknownHeader(String),

    #[error("length prefix '{0}' is not a number")]
    NonNumericLength(String),

    #[error("declared length {declared} overruns the {remaining} remaining bytes")]
    Overrun { declared: usize, remaining: usize },

    #[error("expected a delimiter after a {0}-byte field")]
    MissingDelimiter(usize),

    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("invalid value '{value}' for '{name}'")]
    InvalidValue { name: &'static str, value: String },

    #[error("field is not valid UTF-8")]
    InvalidUtf8,

    #[error("unexpected body for '{0}'")]
    UnexpectedBody(&'static str),
}

/// A decoded message split into its header and optional body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMessage<'a> {
    /// Everything before the first delimiter.
    pub header: &'a str,
    /// Everything after the first delimiter, if there was one.
    pub body: Option<&'a [u8]>,
}

/// Write one message followed by the terminator.
pub fn write_message<W: Write>(writer: &mut W, message: &[u8]) -> io::Result<()> {
    let mut framed = Vec::with_capacity(message.len() + 1);
    framed.extend_from_slice(message);
    framed.push(TERMINATOR);
    writer.write_all(&framed)?;
    writer.flush()
}

/// Read one message off the channel, with the terminator stripped.
///
/// The peer may deliver the message in arbitrarily small chunks, so this
/// keeps reading until the last byte received is the terminator. There is
/// no timeout here; a closed channel before the terminator is an error.
pub fn read_message<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut message = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = match reader.read(&mut chunk) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "channel closed before the message terminator",
                ))
            }
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        message.extend_from_slice(&chunk[..n]);
        if message.last() == Some(&TERMINATOR) {
            message.pop();
            return Ok(message);
        }
    }
}

/// Split a message on its first delimiter.
pub fn decode_message(message: &[u8]) -> Result<RawMessage<'_>, FieldError> {
    let (header, body) = match split_once(message) {
        Some((header, body)) => (header, Some(body)),
        None => (message, None),
    };
    let header = std::str::from_utf8(header).map_err(|_| FieldError::InvalidUtf8)?;
    Ok(RawMessage { header, body })
}

/// Append `<len>|<bytes>` to `buf`.
pub fn push_sub_field(buf: &mut Vec<u8>, field: &[u8]) {
    buf.extend_from_slice(field.len().to_string().as_bytes());
    buf.push(DELIMITER);
    buf.extend_from_slice(field);
}

/// Append a plain field followed by the delimiter.
pub fn push_field(buf: &mut Vec<u8>, field: &str) {
    buf.extend_from_slice(field.as_bytes());
    buf.push(DELIMITER);
}

/// Split `bytes` at the first delimiter, dropping the delimiter.
pub fn split_once(bytes: &[u8]) -> Option<(&[u8], &[u8])> {
    bytes
        .iter()
        .position(|&b| b == DELIMITER)
        .map(|i| (&bytes[..i], &bytes[i + 1..]))
}

/// Read a sequence of length-prefixed sub-fields.
///
/// An empty input holds no fields. Every field must be followed either by
/// the end of input or by a delimiter and another field.
pub fn split_sub_fields(mut rest: &[u8]) -> Result<Vec<&[u8]>, FieldError> {
    let mut fields = Vec::new();

    while !rest.is_empty() {
        let (len, after_len) =
            split_once(rest).ok_or_else(|| FieldError::NonNumericLength(lossy(rest)))?;
        let declared = parse_length(len)?;

        if declared > after_len.len() {
            return Err(FieldError::Overrun {
                declared,
                remaining: after_len.len(),
            });
        }

        let (field, after_field) = after_len.split_at(declared);
        fields.push(field);

        rest = match after_field.split_first() {
            None => after_field,
            Some((&DELIMITER, next)) => {
                if next.is_empty() {
                    // A trailing delimiter introduces nothing.
                    return Err(FieldError::NonNumericLength(String::new()));
                }
                next
            }
            Some(_) => return Err(FieldError::MissingDelimiter(declared)),
        };
    }

    Ok(fields)
}

/// Decode a field as UTF-8 text.
pub fn field_str(field: &[u8]) -> Result<&str, FieldError> {
    std::str::from_utf8(field).map_err(|_| FieldError::InvalidUtf8)
}

/// Parse a `true`/`false` field (case-insensitive).
pub fn parse_bool(name: &'static str, field: &[u8]) -> Result<bool, FieldError> {
    let text = field_str(field)?;
    if text.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if text.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(FieldError::InvalidValue {
            name,
            value: text.to_string(),
        })
    }
}

/// Render a bool the way the wire expects it.
pub fn format_bool(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Lossy text rendering of raw bytes, for error messages.
pub fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn parse_length(len: &[u8]) -> Result<usize, FieldError> {
    if len.is_empty() || !len.iter().all(u8::is_ascii_digit) {
        return Err(FieldError::NonNumericLength(lossy(len)));
    }
    field_str(len)?
        .parse()
        .map_err(|_| FieldError::NonNumericLength(lossy(len)))
}
