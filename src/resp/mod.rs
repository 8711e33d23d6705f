//! RESP Protocol Module
//!
//! Parser and encoder for the subset of RESP 2 the server speaks.
//!
//! ## Wire Format
//!
//! Every value starts with a one-byte type prefix and is CRLF-delimited:
//!
//! ```text
//! +OK\r\n                          simple string
//! -ERR unknown command\r\n         error
//! :1\r\n                           integer
//! $3\r\nfoo\r\n                    bulk string ($-1\r\n = null)
//! *2\r\n$3\r\nGET\r\n$3\r\nfoo\r\n array  (*-1\r\n = null)
//! ```

mod parser;
mod value;

pub use parser::{parse, ParseError};
pub use value::{reply, RespValue, CRLF};
