//! FlintKV Server Binary
//!
//! Restores the keyspace from the snapshot file, starts the worker fleet
//! and the periodic snapshotter, then waits for stdin to close before
//! shutting everything down in order.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use flintkv::network::RequestHandler;
use flintkv::{Config, Dispatcher, Keyspace, Server, Snapshotter};

/// FlintKV Server
#[derive(Parser, Debug)]
#[command(name = "flintkv-server")]
#[command(about = "In-memory RESP key-value server with periodic snapshots")]
#[command(version)]
struct Args {
    /// Port to listen on (all interfaces)
    #[arg(short, long, default_value_t = flintkv::DEFAULT_PORT)]
    port: u16,

    /// Worker threads; 0 means one per available core
    #[arg(short, long, default_value_t = 0)]
    workers: usize,

    /// Snapshot file path
    #[arg(short, long, default_value = flintkv::DEFAULT_SNAPSHOT_FILE)]
    snapshot_file: String,

    /// Milliseconds between periodic snapshots
    #[arg(long, default_value_t = 10_000)]
    snapshot_interval_ms: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,flintkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .port(args.port)
        .num_workers(args.workers)
        .snapshot_path(&args.snapshot_file)
        .snapshot_interval_ms(args.snapshot_interval_ms)
        .build();

    if let Err(e) = run(config) {
        tracing::error!("server error: {}", e);
        std::process::exit(1);
    }
}

fn run(config: Config) -> flintkv::Result<()> {
    tracing::info!("FlintKV v{}", flintkv::VERSION);
    tracing::info!("Snapshot file: {}", config.snapshot_path.display());

    // Restore whatever the last snapshot held
    let keyspace = Arc::new(Keyspace::open(&config.snapshot_path)?);

    let dispatcher = Dispatcher::new(Arc::clone(&keyspace));
    let handler: RequestHandler = Arc::new(move |request| dispatcher.handle_request(request));

    let mut server = Server::bind(config.port, config.effective_workers())?;
    server.set_request_handler(handler);
    server.start()?;

    let mut snapshotter = Snapshotter::start(
        Arc::clone(&keyspace),
        config.snapshot_path.clone(),
        Duration::from_millis(config.snapshot_interval_ms),
    )?;

    wait_for_stdin_eof();
    tracing::info!("stdin closed, shutting down");

    server.stop();
    snapshotter.stop();

    // Last snapshot before exit; a failure here is logged, not fatal
    if let Err(e) = keyspace.snapshot(&config.snapshot_path) {
        tracing::warn!("final snapshot failed: {}", e);
    }

    Ok(())
}

/// Block until the operator closes stdin.
fn wait_for_stdin_eof() {
    let mut line = String::new();
    loop {
        line.clear();
        match std::io::stdin().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
    }
}
