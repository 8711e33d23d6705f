//! # FlintKV
//!
//! An in-memory key-value server that:
//! - Speaks a subset of the Redis serialization protocol (RESP 2)
//! - Serves `GET` / `SET` / `DEL` over TCP
//! - Runs one reactor thread per core, all accepting on the same port
//! - Periodically snapshots the keyspace to a binary file
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Server (supervisor)                       │
//! │   ┌──────────┐  ┌──────────┐        ┌──────────┐            │
//! │   │ Worker 0 │  │ Worker 1 │  ...   │ Worker N │            │
//! │   │ (thread) │  │ (thread) │        │ (thread) │            │
//! │   └─────┬────┘  └─────┬────┘        └─────┬────┘            │
//! └─────────┼─────────────┼───────────────────┼─────────────────┘
//!           │   RESP parse → dispatch → RESP encode
//!           ▼             ▼                   ▼
//!   ┌─────────────────────────────────────────────┐
//!   │               Keyspace (RwLock)             │◄── Snapshotter
//!   └─────────────────────────────────────────────┘     (thread)
//!                                                          │
//!                                                          ▼
//!                                                    kvstore.dat
//! ```
//!
//! Workers share exactly one object: the keyspace. Everything else
//! (listening-socket handles, accepted connections, read buffers) is owned
//! by a single thread.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod dispatch;
pub mod network;
pub mod resp;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use dispatch::Dispatcher;
pub use error::{FlintError, Result};
pub use network::Server;
pub use resp::{ParseError, RespValue};
pub use store::{Keyspace, Snapshotter};

// =============================================================================
// Defaults
// =============================================================================

/// Current version of FlintKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default TCP port the server listens on
pub const DEFAULT_PORT: u16 = 9001;

/// Default snapshot file name (relative to the working directory)
pub const DEFAULT_SNAPSHOT_FILE: &str = "kvstore.dat";
