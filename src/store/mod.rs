//! Storage Module
//!
//! The in-memory keyspace and its snapshot machinery.
//!
//! ## Responsibilities
//! - Thread-safe map with shared reads and exclusive writes
//! - Point-in-time serialization to a binary snapshot file
//! - Restore from a snapshot on startup
//! - Background thread driving periodic snapshots

mod keyspace;
mod snapshot;

pub use keyspace::Keyspace;
pub use snapshot::Snapshotter;
