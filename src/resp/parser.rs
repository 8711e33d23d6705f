//! Streaming RESP parser.
//!
//! The parser consumes exactly one complete value per call, advancing a
//! caller-owned cursor. It performs no I/O and never mutates its input. A
//! request that does not contain a complete value fails; the dispatcher
//! turns that failure into an error reply for the current request, and the
//! connection stays open.
//!
//! On failure the cursor is left wherever parsing stopped; callers must not
//! resume from it.

use bytes::Bytes;
use thiserror::Error;

use super::value::{prefix, RespValue};

/// Maximum array nesting depth, guarding recursion against hostile input.
const MAX_NESTING_DEPTH: usize = 32;

/// Errors produced while parsing a RESP value.
///
/// Every message is a single line; the dispatcher embeds it directly in an
/// `-ERR …` reply.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The cursor is at (or past) the end of the buffer
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// Unknown type prefix byte
    #[error("invalid type prefix: {0:#04x}")]
    UnknownPrefix(u8),

    /// A line is not terminated by CRLF within the buffer
    #[error("unterminated line")]
    UnterminatedLine,

    /// An integer or length field is not a valid signed decimal spanning
    /// its entire field
    #[error("invalid integer: {0}")]
    InvalidInteger(String),

    /// Invalid UTF-8 in a simple string or error line
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(String),

    /// Bulk string length below -1
    #[error("invalid bulk string length: {0}")]
    InvalidBulkLength(i64),

    /// Array length below -1
    #[error("invalid array length: {0}")]
    InvalidArrayLength(i64),

    /// Declared bulk body plus terminator exceeds the buffer
    #[error("incomplete bulk string")]
    IncompleteBulk,

    /// The two bytes after a bulk body are not CRLF
    #[error("bulk string missing trailing CRLF")]
    MissingBulkTerminator,

    /// Arrays nested deeper than the parser is willing to recurse
    #[error("nesting depth exceeded")]
    DepthExceeded,
}

/// Result type for parsing operations.
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Parses one RESP value from `buf` starting at `*pos`.
///
/// On success the cursor is advanced past the parsed value, so back-to-back
/// frames in one buffer parse out in order across repeated calls.
pub fn parse(buf: &[u8], pos: &mut usize) -> ParseResult<RespValue> {
    parse_at(buf, pos, 0)
}

fn parse_at(buf: &[u8], pos: &mut usize, depth: usize) -> ParseResult<RespValue> {
    if depth > MAX_NESTING_DEPTH {
        return Err(ParseError::DepthExceeded);
    }

    if *pos >= buf.len() {
        return Err(ParseError::UnexpectedEof);
    }

    let first = buf[*pos];
    *pos += 1;

    match first {
        prefix::SIMPLE_STRING => {
            let line = read_line(buf, pos)?;
            Ok(RespValue::SimpleString(utf8_line(line)?))
        }
        prefix::ERROR => {
            let line = read_line(buf, pos)?;
            Ok(RespValue::Error(utf8_line(line)?))
        }
        prefix::INTEGER => {
            let line = read_line(buf, pos)?;
            Ok(RespValue::Integer(parse_i64(line)?))
        }
        prefix::BULK_STRING => parse_bulk_string(buf, pos),
        prefix::ARRAY => parse_array(buf, pos, depth),
        other => Err(ParseError::UnknownPrefix(other)),
    }
}

/// Bulk string: `$<len>\r\n<len bytes>\r\n`, with `$-1\r\n` meaning null.
fn parse_bulk_string(buf: &[u8], pos: &mut usize) -> ParseResult<RespValue> {
    let length = parse_i64(read_line(buf, pos)?)?;

    if length == -1 {
        return Ok(RespValue::Null);
    }
    if length < 0 {
        return Err(ParseError::InvalidBulkLength(length));
    }

    let length = length as usize;
    if pos.checked_add(length + 2).map_or(true, |end| end > buf.len()) {
        return Err(ParseError::IncompleteBulk);
    }
    if buf[*pos + length] != b'\r' || buf[*pos + length + 1] != b'\n' {
        return Err(ParseError::MissingBulkTerminator);
    }

    let data = Bytes::copy_from_slice(&buf[*pos..*pos + length]);
    *pos += length + 2;
    Ok(RespValue::BulkString(data))
}

/// Array: `*<count>\r\n` followed by count nested values; `*-1\r\n` is null.
fn parse_array(buf: &[u8], pos: &mut usize, depth: usize) -> ParseResult<RespValue> {
    let count = parse_i64(read_line(buf, pos)?)?;

    if count == -1 {
        return Ok(RespValue::Null);
    }
    if count < 0 {
        return Err(ParseError::InvalidArrayLength(count));
    }

    let count = count as usize;
    let mut elements = Vec::with_capacity(count.min(64));
    for _ in 0..count {
        elements.push(parse_at(buf, pos, depth + 1)?);
    }

    Ok(RespValue::Array(elements))
}

/// Reads up to the next CRLF, returning the line content (without the
/// terminator) and advancing the cursor past it.
fn read_line<'a>(buf: &'a [u8], pos: &mut usize) -> ParseResult<&'a [u8]> {
    let start = *pos;
    let end = find_crlf(buf, start).ok_or(ParseError::UnterminatedLine)?;
    *pos = end + 2;
    Ok(&buf[start..end])
}

fn find_crlf(buf: &[u8], from: usize) -> Option<usize> {
    let mut i = from;
    while i + 1 < buf.len() {
        if buf[i] == b'\r' && buf[i + 1] == b'\n' {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Parses a signed decimal that must span the entire field.
fn parse_i64(field: &[u8]) -> ParseResult<i64> {
    let s = std::str::from_utf8(field)
        .map_err(|e| ParseError::InvalidInteger(e.to_string()))?;
    s.parse()
        .map_err(|e: std::num::ParseIntError| ParseError::InvalidInteger(e.to_string()))
}

fn utf8_line(line: &[u8]) -> ParseResult<String> {
    String::from_utf8(line.to_vec()).map_err(|e| ParseError::InvalidUtf8(e.to_string()))
}
