//! Server supervisor.
//!
//! Builds the worker fleet on one shared port and manages its lifecycle.
//! The supervisor performs no I/O itself: it binds the listening socket,
//! hands each worker a cloned handle of it, fans the request handler out,
//! and starts/stops/joins the threads.

use std::net::{Ipv4Addr, SocketAddr, TcpListener};

use crate::error::{FlintError, Result};

use super::worker::{RequestHandler, Worker};

/// Multi-worker TCP server
pub struct Server {
    workers: Vec<Worker>,
    local_addr: SocketAddr,
    running: bool,
}

impl Server {
    /// Bind `0.0.0.0:<port>` and construct `num_workers` workers (minimum
    /// one) sharing that socket. Port 0 binds an ephemeral port; see
    /// [`local_addr`](Self::local_addr).
    ///
    /// Any socket or worker construction failure aborts server creation.
    pub fn bind(port: u16, num_workers: usize) -> Result<Self> {
        let num_workers = num_workers.max(1);

        let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
            .map_err(|e| FlintError::Setup(format!("bind 0.0.0.0:{}: {}", port, e)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| FlintError::Setup(format!("local_addr: {}", e)))?;

        let mut workers = Vec::with_capacity(num_workers);
        for id in 0..num_workers {
            let handle = listener.try_clone().map_err(|e| {
                FlintError::Setup(format!("clone listener for worker {}: {}", id, e))
            })?;
            workers.push(Worker::new(id, handle)?);
        }

        Ok(Server {
            workers,
            local_addr,
            running: false,
        })
    }

    /// Install the same request handler into every worker. Must be called
    /// before [`start`](Self::start).
    pub fn set_request_handler(&mut self, handler: RequestHandler) {
        for worker in &mut self.workers {
            worker.set_request_handler(handler.clone());
        }
    }

    /// Launch all worker threads.
    pub fn start(&mut self) -> Result<()> {
        if self.running {
            return Ok(());
        }

        for worker in &mut self.workers {
            worker.start()?;
        }
        self.running = true;

        tracing::info!(
            "listening on {} with {} workers",
            self.local_addr,
            self.workers.len()
        );
        Ok(())
    }

    /// Clear every worker's running flag, then join them all.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }

        tracing::info!("stopping {} workers", self.workers.len());

        // Flag everyone first so the workers wind down in parallel.
        for worker in &self.workers {
            worker.signal_stop();
        }
        for worker in &mut self.workers {
            worker.stop();
        }

        self.running = false;
        tracing::info!("server stopped");
    }

    /// The bound listen address (useful with port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of workers in the fleet
    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    /// Whether `start` has run and `stop` has not
    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.stop();
    }
}
