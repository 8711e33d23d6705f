//! RESP value type and response encoders.

use bytes::Bytes;
use std::fmt;

/// The CRLF terminator used throughout the protocol
pub const CRLF: &[u8] = b"\r\n";

/// RESP type prefix bytes
pub(crate) mod prefix {
    pub const SIMPLE_STRING: u8 = b'+';
    pub const ERROR: u8 = b'-';
    pub const INTEGER: u8 = b':';
    pub const BULK_STRING: u8 = b'$';
    pub const ARRAY: u8 = b'*';
}

/// A single RESP value.
///
/// Parsed values form an owning tree: arrays hold their elements directly.
/// A value lives for one request/response cycle and is discarded afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    /// Non-binary-safe one-line string: `+<string>\r\n`
    SimpleString(String),

    /// Error condition: `-<message>\r\n`
    Error(String),

    /// 64-bit signed integer: `:<n>\r\n`
    Integer(i64),

    /// Binary-safe string: `$<len>\r\n<data>\r\n`
    BulkString(Bytes),

    /// Null, from either `$-1\r\n` or `*-1\r\n`
    Null,

    /// `*<count>\r\n` followed by count nested values
    Array(Vec<RespValue>),
}

impl RespValue {
    pub fn simple_string(s: impl Into<String>) -> Self {
        RespValue::SimpleString(s.into())
    }

    pub fn error(s: impl Into<String>) -> Self {
        RespValue::Error(s.into())
    }

    pub fn bulk_string(data: impl Into<Bytes>) -> Self {
        RespValue::BulkString(data.into())
    }

    /// Serializes this value to its canonical wire form.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_into(&mut buf);
        buf
    }

    /// Serializes this value into an existing buffer.
    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        match self {
            RespValue::SimpleString(s) => {
                buf.push(prefix::SIMPLE_STRING);
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(CRLF);
            }
            RespValue::Error(s) => {
                buf.push(prefix::ERROR);
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(CRLF);
            }
            RespValue::Integer(n) => {
                buf.push(prefix::INTEGER);
                buf.extend_from_slice(n.to_string().as_bytes());
                buf.extend_from_slice(CRLF);
            }
            RespValue::BulkString(data) => {
                buf.push(prefix::BULK_STRING);
                buf.extend_from_slice(data.len().to_string().as_bytes());
                buf.extend_from_slice(CRLF);
                buf.extend_from_slice(data);
                buf.extend_from_slice(CRLF);
            }
            RespValue::Null => {
                buf.extend_from_slice(b"$-1");
                buf.extend_from_slice(CRLF);
            }
            RespValue::Array(values) => {
                buf.push(prefix::ARRAY);
                buf.extend_from_slice(values.len().to_string().as_bytes());
                buf.extend_from_slice(CRLF);
                for value in values {
                    value.serialize_into(buf);
                }
            }
        }
    }

    /// The string content of a SimpleString or BulkString, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RespValue::SimpleString(s) => Some(s),
            RespValue::BulkString(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// The byte content of a SimpleString or BulkString, if any.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            RespValue::SimpleString(s) => Some(s.as_bytes()),
            RespValue::BulkString(b) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Display for RespValue {
    /// redis-cli style rendering, used by the CLI client.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RespValue::SimpleString(s) => write!(f, "{}", s),
            RespValue::Error(s) => write!(f, "(error) {}", s),
            RespValue::Integer(n) => write!(f, "(integer) {}", n),
            RespValue::BulkString(data) => match std::str::from_utf8(data) {
                Ok(s) => write!(f, "\"{}\"", s),
                Err(_) => write!(f, "(binary data, {} bytes)", data.len()),
            },
            RespValue::Null => write!(f, "(nil)"),
            RespValue::Array(values) => {
                if values.is_empty() {
                    write!(f, "(empty array)")
                } else {
                    for (i, v) in values.iter().enumerate() {
                        if i > 0 {
                            writeln!(f)?;
                        }
                        write!(f, "{}) {}", i + 1, v)?;
                    }
                    Ok(())
                }
            }
        }
    }
}

/// Closed-form reply encoders.
///
/// These return the exact byte strings the server sends; the dispatcher
/// never goes through [`RespValue`] on the response path.
pub mod reply {
    use super::CRLF;

    /// `+OK\r\n`
    pub fn ok() -> Vec<u8> {
        b"+OK\r\n".to_vec()
    }

    /// `$<len>\r\n<value>\r\n`
    pub fn bulk(value: &[u8]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(value.len() + 16);
        buf.push(b'$');
        buf.extend_from_slice(value.len().to_string().as_bytes());
        buf.extend_from_slice(CRLF);
        buf.extend_from_slice(value);
        buf.extend_from_slice(CRLF);
        buf
    }

    /// `$-1\r\n` (null bulk string, for a missing key)
    pub fn missing() -> Vec<u8> {
        b"$-1\r\n".to_vec()
    }

    /// `:1\r\n` or `:0\r\n` (DEL result)
    pub fn deleted(deleted: bool) -> Vec<u8> {
        if deleted {
            b":1\r\n".to_vec()
        } else {
            b":0\r\n".to_vec()
        }
    }

    /// `-<message>\r\n`. The message must not contain CR or LF; callers
    /// only pass single-line messages.
    pub fn error(message: &str) -> Vec<u8> {
        let mut buf = Vec::with_capacity(message.len() + 3);
        buf.push(b'-');
        buf.extend_from_slice(message.as_bytes());
        buf.extend_from_slice(CRLF);
        buf
    }
}
