//! Snapshot record codec and the periodic snapshotter thread.
//!
//! ## File Format
//!
//! A snapshot is a flat sequence of records, no header or footer:
//!
//! ```text
//! ┌───────────┬───────────┬───────────┬─────────────┐
//! │ key_len 8 │ key bytes │ val_len 8 │ value bytes │  ... repeated
//! └───────────┴───────────┴───────────┴─────────────┘
//! ```
//!
//! Lengths are fixed u64 little-endian so the file is portable across
//! platforms. There is no checksum; a truncated tail is detected only by
//! running out of bytes mid-record.

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bytes::Bytes;
use crossbeam::channel::{bounded, RecvTimeoutError, Sender};

use super::Keyspace;
use crate::error::{FlintError, Result};

/// Width of a record length field
const LEN_BYTES: usize = 8;

/// Upper bound on a single key or value; a length beyond this is treated
/// as corruption rather than an allocation request.
const MAX_RECORD_LEN: u64 = 1 << 30;

/// Write one `(key, value)` record.
pub(super) fn write_record<W: Write>(w: &mut W, key: &[u8], value: &[u8]) -> io::Result<()> {
    w.write_all(&(key.len() as u64).to_le_bytes())?;
    w.write_all(key)?;
    w.write_all(&(value.len() as u64).to_le_bytes())?;
    w.write_all(value)?;
    Ok(())
}

/// Read one record.
///
/// `Ok(None)` means a clean end of file at a record boundary. An
/// `UnexpectedEof` error means the file ends mid-record; `InvalidData`
/// means a length field is implausibly large. Callers treat both as a
/// truncated snapshot and stop loading.
pub(super) fn read_record<R: Read>(r: &mut R) -> io::Result<Option<(Bytes, Bytes)>> {
    let key_len = match read_len(r)? {
        Some(n) => n,
        None => return Ok(None),
    };
    let key = read_exact_vec(r, key_len)?;

    let value_len = match read_len(r)? {
        Some(n) => n,
        None => return Err(io::ErrorKind::UnexpectedEof.into()),
    };
    let value = read_exact_vec(r, value_len)?;

    Ok(Some((key.into(), value.into())))
}

/// Read a length field; `Ok(None)` on end of file before any byte.
fn read_len<R: Read>(r: &mut R) -> io::Result<Option<usize>> {
    let mut buf = [0u8; LEN_BYTES];
    let mut filled = 0;
    while filled < LEN_BYTES {
        match r.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => return Err(io::ErrorKind::UnexpectedEof.into()),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }

    let len = u64::from_le_bytes(buf);
    if len > MAX_RECORD_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("record length {} exceeds limit", len),
        ));
    }
    Ok(Some(len as usize))
}

fn read_exact_vec<R: Read>(r: &mut R, len: usize) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

/// Background thread that snapshots the keyspace on a fixed period.
///
/// The thread parks on a shutdown channel between runs, so `stop` takes
/// effect immediately instead of waiting out the interval. Dropping the
/// snapshotter stops and joins it.
pub struct Snapshotter {
    shutdown: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl Snapshotter {
    /// Spawn the snapshot thread.
    pub fn start(keyspace: Arc<Keyspace>, path: PathBuf, interval: Duration) -> Result<Self> {
        let (shutdown, ticker) = bounded::<()>(1);

        let handle = thread::Builder::new()
            .name("flintkv-snapshot".to_string())
            .spawn(move || {
                tracing::debug!(
                    "snapshotter started, interval {} ms, file {}",
                    interval.as_millis(),
                    path.display()
                );

                loop {
                    match ticker.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            if let Err(e) = keyspace.snapshot(&path) {
                                tracing::warn!("periodic snapshot failed: {}", e);
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }

                tracing::debug!("snapshotter stopped");
            })
            .map_err(|e| FlintError::Setup(format!("failed to spawn snapshotter: {}", e)))?;

        Ok(Snapshotter {
            shutdown,
            handle: Some(handle),
        })
    }

    /// Signal the thread and join it. Idempotent.
    pub fn stop(&mut self) {
        let _ = self.shutdown.try_send(());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("snapshotter thread panicked");
            }
        }
    }
}

impl Drop for Snapshotter {
    fn drop(&mut self) {
        self.stop();
    }
}
