//! Worker reactor thread.
//!
//! Each worker owns a handle to the shared listening socket plus every
//! connection it has accepted, and runs a level-triggered poll loop:
//! accept until the kernel would block, then give each connection one
//! non-blocking read, then sleep one interval if nothing happened. The
//! loop re-checks its running flag every iteration, so a stop request
//! takes effect within the poll interval.

use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::{FlintError, Result};

/// Handler invoked with the bytes of one kernel read; returns the reply
/// bytes to send. Shared by every worker.
pub type RequestHandler = Arc<dyn Fn(&[u8]) -> Vec<u8> + Send + Sync>;

/// Cap on accepts taken in a single loop iteration, so a connect flood
/// cannot starve established connections.
const MAX_EVENTS: usize = 100;

/// One kernel read per connection per iteration lands here.
const READ_BUFFER_SIZE: usize = 1024;

/// Idle sleep between iterations when no event occurred.
const IDLE_POLL: Duration = Duration::from_millis(10);

/// A single reactor thread and its lifecycle state.
pub(super) struct Worker {
    id: usize,
    listener: Option<TcpListener>,
    handler: Option<RequestHandler>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Wrap a listening-socket handle. The handle is switched to
    /// non-blocking here; failure is fatal to server construction.
    pub(super) fn new(id: usize, listener: TcpListener) -> Result<Self> {
        listener.set_nonblocking(true).map_err(|e| {
            FlintError::Setup(format!("worker {}: set_nonblocking failed: {}", id, e))
        })?;

        Ok(Worker {
            id,
            listener: Some(listener),
            handler: None,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        })
    }

    pub(super) fn set_request_handler(&mut self, handler: RequestHandler) {
        self.handler = Some(handler);
    }

    /// Launch the reactor thread. Requires a handler to be installed.
    pub(super) fn start(&mut self) -> Result<()> {
        if self.running.load(Ordering::Relaxed) {
            return Ok(());
        }

        let handler = self.handler.clone().ok_or_else(|| {
            FlintError::Setup("request handler must be installed before start".to_string())
        })?;
        let listener = self
            .listener
            .take()
            .ok_or_else(|| FlintError::Setup(format!("worker {} already consumed", self.id)))?;

        self.running.store(true, Ordering::Relaxed);
        let running = Arc::clone(&self.running);
        let id = self.id;

        let handle = thread::Builder::new()
            .name(format!("flintkv-worker-{}", id))
            .spawn(move || {
                pin_to_core(id);
                event_loop(id, listener, handler, running);
            })
            .map_err(|e| {
                self.running.store(false, Ordering::Relaxed);
                FlintError::Setup(format!("failed to spawn worker {}: {}", id, e))
            })?;

        self.handle = Some(handle);
        Ok(())
    }

    /// Ask the reactor loop to exit; observed within the poll interval.
    pub(super) fn signal_stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Signal and join. Idempotent.
    pub(super) fn stop(&mut self) {
        self.signal_stop();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("worker {} thread panicked", self.id);
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The reactor loop. Returns when the running flag clears or on a fatal
/// accept error; open connections are dropped (closed) either way.
fn event_loop(
    id: usize,
    listener: TcpListener,
    handler: RequestHandler,
    running: Arc<AtomicBool>,
) {
    let mut connections: Vec<Connection> = Vec::new();
    let mut buf = [0u8; READ_BUFFER_SIZE];

    tracing::debug!("worker {} started", id);

    while running.load(Ordering::Relaxed) {
        let mut events = 0;

        // Drain the accept backlog until the kernel would block.
        while events < MAX_EVENTS {
            match listener.accept() {
                Ok((stream, addr)) => match Connection::new(stream, addr) {
                    Ok(conn) => {
                        tracing::debug!("worker {} accepted {}", id, addr);
                        connections.push(conn);
                        events += 1;
                    }
                    Err(e) => {
                        tracing::debug!("worker {}: could not configure {}: {}", id, addr, e);
                    }
                },
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    // Non-recoverable accept failure: this worker leaves the
                    // fleet; the supervisor does not restart it.
                    tracing::error!("worker {}: accept failed, exiting: {}", id, e);
                    return;
                }
            }
        }

        // One read per connection per iteration (level-triggered): a burst
        // larger than the read buffer drains over successive iterations.
        connections.retain_mut(|conn| match conn.service(&handler, &mut buf) {
            ServiceOutcome::Progress => {
                events += 1;
                true
            }
            ServiceOutcome::Idle => true,
            ServiceOutcome::Closed => {
                tracing::debug!("worker {}: {} disconnected", id, conn.addr);
                false
            }
        });

        if events == 0 {
            thread::sleep(IDLE_POLL);
        }
    }

    tracing::debug!(
        "worker {} stopped, closing {} connections",
        id,
        connections.len()
    );
}

enum ServiceOutcome {
    /// A request was served (or data moved)
    Progress,
    /// Nothing to read right now
    Idle,
    /// Peer closed or the connection failed; drop it
    Closed,
}

/// One accepted client socket.
struct Connection {
    stream: TcpStream,
    addr: SocketAddr,
}

impl Connection {
    fn new(stream: TcpStream, addr: SocketAddr) -> std::io::Result<Self> {
        stream.set_nonblocking(true)?;
        stream.set_nodelay(true)?;
        Ok(Connection { stream, addr })
    }

    /// One read, one handler invocation, one send.
    ///
    /// The reply goes out in a single send; if the kernel takes only part
    /// of it the remainder is dropped (there is no per-connection write
    /// queue). Broken pipes surface as send errors, which close the
    /// connection.
    fn service(&mut self, handler: &RequestHandler, buf: &mut [u8]) -> ServiceOutcome {
        let n = match self.stream.read(buf) {
            Ok(0) => return ServiceOutcome::Closed,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::WouldBlock => return ServiceOutcome::Idle,
            Err(e) if e.kind() == ErrorKind::Interrupted => return ServiceOutcome::Idle,
            Err(e) => {
                tracing::debug!("read from {} failed: {}", self.addr, e);
                return ServiceOutcome::Closed;
            }
        };

        let response = handler(&buf[..n]);

        match self.stream.write(&response) {
            Ok(sent) if sent < response.len() => {
                tracing::debug!(
                    "partial send to {}: {} of {} bytes, remainder dropped",
                    self.addr,
                    sent,
                    response.len()
                );
                ServiceOutcome::Progress
            }
            Ok(_) => ServiceOutcome::Progress,
            Err(e) if e.kind() == ErrorKind::WouldBlock => ServiceOutcome::Progress,
            Err(e) => {
                tracing::debug!("send to {} failed: {}", self.addr, e);
                ServiceOutcome::Closed
            }
        }
    }
}

/// Best-effort pin of the current thread to core `id mod core count`.
/// Failure is ignored; pinning is an optimization, not a requirement.
fn pin_to_core(id: usize) {
    if let Some(cores) = core_affinity::get_core_ids() {
        if !cores.is_empty() {
            let _ = core_affinity::set_for_current(cores[id % cores.len()]);
        }
    }
}
