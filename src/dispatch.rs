//! Command dispatcher.
//!
//! Turns raw request bytes into RESP reply bytes: parse, validate the
//! command shape, run the keyspace operation, encode the reply. Parse and
//! command errors become `-ERR …` replies; the dispatcher itself never
//! fails and the connection stays open.

use std::sync::Arc;

use bytes::Bytes;

use crate::resp::{self, reply, RespValue};
use crate::store::Keyspace;

/// Dispatches parsed commands into the keyspace.
///
/// Cheap to clone into a request-handler closure; all state is the shared
/// keyspace reference.
#[derive(Clone)]
pub struct Dispatcher {
    keyspace: Arc<Keyspace>,
}

impl Dispatcher {
    pub fn new(keyspace: Arc<Keyspace>) -> Self {
        Dispatcher { keyspace }
    }

    /// Answer every complete frame in `request`, in order.
    ///
    /// A well-formed buffer of back-to-back frames gets one reply per
    /// frame. A malformed frame produces a single error reply and ends
    /// processing of this buffer.
    pub fn handle_request(&self, request: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut pos = 0;

        while pos < request.len() {
            match resp::parse(request, &mut pos) {
                Ok(value) => out.extend_from_slice(&self.dispatch(value)),
                Err(e) => {
                    out.extend_from_slice(&reply::error(&format!("ERR {}", e)));
                    break;
                }
            }
        }

        out
    }

    /// Map one parsed RESP value to a keyspace operation and its reply.
    ///
    /// Command names match case-sensitively (`GET`, `SET`, `DEL`). Wrong
    /// arity is answered exactly like an unknown command.
    fn dispatch(&self, request: RespValue) -> Vec<u8> {
        let items = match request {
            RespValue::Array(items) if !items.is_empty() => items,
            _ => return reply::error("ERR invalid command"),
        };

        let name = match &items[0] {
            RespValue::BulkString(b) => b.clone(),
            RespValue::SimpleString(s) => Bytes::copy_from_slice(s.as_bytes()),
            _ => return reply::error("ERR invalid command"),
        };

        let name = name.as_ref();
        let argc = items.len();

        if name == b"GET" && argc == 2 {
            let Some(key) = arg_bytes(&items[1]) else {
                return reply::error("ERR invalid command");
            };
            match self.keyspace.get(&key) {
                Some(value) => reply::bulk(&value),
                None => reply::missing(),
            }
        } else if name == b"SET" && argc == 3 {
            let (Some(key), Some(value)) = (arg_bytes(&items[1]), arg_bytes(&items[2])) else {
                return reply::error("ERR invalid command");
            };
            self.keyspace.set(key, value);
            reply::ok()
        } else if name == b"DEL" && argc == 2 {
            let Some(key) = arg_bytes(&items[1]) else {
                return reply::error("ERR invalid command");
            };
            reply::deleted(self.keyspace.del(&key))
        } else {
            reply::error("ERR unknown command")
        }
    }
}

/// Command arguments may arrive as bulk or simple strings; anything else
/// is not a valid argument.
fn arg_bytes(value: &RespValue) -> Option<Bytes> {
    match value {
        RespValue::BulkString(b) => Some(b.clone()),
        RespValue::SimpleString(s) => Some(Bytes::copy_from_slice(s.as_bytes())),
        _ => None,
    }
}
