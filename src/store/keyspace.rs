//! The concurrent keyspace.
//!
//! A flat map from byte-string keys to byte-string values behind a single
//! readers-writer lock. Uses `parking_lot::RwLock`, which never poisons on
//! panic. The snapshotter competes with writers for this lock; everything
//! else about the server is share-nothing.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;

use bytes::Bytes;
use parking_lot::RwLock;

use super::snapshot;
use crate::error::Result;

/// In-memory key-value map with snapshot persistence
pub struct Keyspace {
    data: RwLock<HashMap<Bytes, Bytes>>,
}

impl Keyspace {
    /// Create an empty keyspace
    pub fn new() -> Self {
        Keyspace {
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Create a keyspace restored from a snapshot file.
    ///
    /// An absent file yields an empty keyspace. A file truncated mid-record
    /// keeps every record read up to that point; loading stops there with a
    /// warning rather than an error.
    pub fn open(path: &Path) -> Result<Self> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("no snapshot at {}, starting empty", path.display());
                return Ok(Self::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut reader = BufReader::new(file);
        let mut map = HashMap::new();

        loop {
            match snapshot::read_record(&mut reader) {
                Ok(Some((key, value))) => {
                    map.insert(key, value);
                }
                Ok(None) => break,
                Err(e) if matches!(e.kind(), ErrorKind::UnexpectedEof | ErrorKind::InvalidData) => {
                    tracing::warn!(
                        "snapshot {} truncated or corrupt, kept {} entries",
                        path.display(),
                        map.len()
                    );
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::info!("restored {} entries from {}", map.len(), path.display());
        Ok(Keyspace {
            data: RwLock::new(map),
        })
    }

    /// Get the value for a key (shared access)
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        let data = self.data.read();
        data.get(key).cloned()
    }

    /// Insert or overwrite a key-value pair (exclusive access)
    pub fn set(&self, key: Bytes, value: Bytes) {
        let mut data = self.data.write();
        data.insert(key, value);
    }

    /// Remove a key (exclusive access), returning whether it existed
    pub fn del(&self, key: &[u8]) -> bool {
        let mut data = self.data.write();
        data.remove(key).is_some()
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the keyspace holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serialize every entry to `path`, truncating any previous file.
    ///
    /// The read lock is held for the whole iteration: readers keep making
    /// progress, writers wait, and the file is a point-in-time image. On an
    /// I/O error a partial file may remain; it is not cleaned up.
    pub fn snapshot(&self, path: &Path) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        let mut writer = BufWriter::new(file);

        let data = self.data.read();
        for (key, value) in data.iter() {
            snapshot::write_record(&mut writer, key, value)?;
        }
        drop(data);

        writer.flush()?;
        tracing::debug!("snapshot written to {}", path.display());
        Ok(())
    }
}

impl Default for Keyspace {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_del() {
        let ks = Keyspace::new();

        ks.set(Bytes::from("k"), Bytes::from("v"));
        assert_eq!(ks.get(b"k"), Some(Bytes::from("v")));

        assert!(ks.del(b"k"));
        assert_eq!(ks.get(b"k"), None);
        assert!(!ks.del(b"k"));
    }

    #[test]
    fn test_set_overwrites() {
        let ks = Keyspace::new();

        ks.set(Bytes::from("k"), Bytes::from("v1"));
        ks.set(Bytes::from("k"), Bytes::from("v2"));

        assert_eq!(ks.get(b"k"), Some(Bytes::from("v2")));
        assert_eq!(ks.len(), 1);
    }

    #[test]
    fn test_empty_key_and_value() {
        let ks = Keyspace::new();

        ks.set(Bytes::new(), Bytes::new());
        assert_eq!(ks.get(b""), Some(Bytes::new()));
        assert!(ks.del(b""));
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let ks = Keyspace::open(&dir.path().join("nope.dat")).unwrap();
        assert!(ks.is_empty());
    }
}
