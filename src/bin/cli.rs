//! FlintKV CLI Client
//!
//! One-shot client: encodes a single command as a RESP array of bulk
//! strings over one TCP stream, reads one reply, prints it redis-cli
//! style. Error replies exit non-zero.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use bytes::Bytes;
use clap::{Parser, Subcommand};

use flintkv::resp::{self, ParseError, RespValue};
use flintkv::FlintError;

/// FlintKV CLI
#[derive(Parser, Debug)]
#[command(name = "flintkv-cli")]
#[command(about = "CLI for the FlintKV key-value server")]
#[command(version)]
struct Args {
    /// Server address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:9001")]
    server: String,

    /// Connection timeout in milliseconds
    #[arg(short, long, default_value_t = 5000)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },
}

fn main() {
    let args = Args::parse();

    let request = match &args.command {
        Commands::Get { key } => command_frame(&["GET", key.as_str()]),
        Commands::Set { key, value } => command_frame(&["SET", key.as_str(), value.as_str()]),
        Commands::Del { key } => command_frame(&["DEL", key.as_str()]),
    };

    let addr: SocketAddr = match args.server.parse() {
        Ok(a) => a,
        Err(_) => {
            eprintln!("Invalid server address: {}", args.server);
            std::process::exit(1);
        }
    };

    let timeout = Duration::from_millis(args.timeout);
    let mut stream = match TcpStream::connect_timeout(&addr, timeout) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to connect to {}: {}", args.server, e);
            std::process::exit(1);
        }
    };

    let _ = stream.set_read_timeout(Some(timeout));
    let _ = stream.set_write_timeout(Some(timeout));
    let _ = stream.set_nodelay(true);

    if let Err(e) = stream.write_all(&request).and_then(|_| stream.flush()) {
        eprintln!("Failed to send command: {}", e);
        std::process::exit(1);
    }

    match read_reply(&mut stream) {
        Ok(RespValue::Error(message)) => {
            eprintln!("(error) {}", message);
            std::process::exit(1);
        }
        Ok(value) => println!("{}", value),
        Err(e) => {
            eprintln!("Failed to read reply: {}", e);
            std::process::exit(1);
        }
    }
}

/// Encode one command as a RESP array of bulk strings.
fn command_frame(parts: &[&str]) -> Vec<u8> {
    RespValue::Array(
        parts
            .iter()
            .map(|p| RespValue::BulkString(Bytes::copy_from_slice(p.as_bytes())))
            .collect(),
    )
    .serialize()
}

/// Read until the buffer holds one complete RESP value.
fn read_reply(stream: &mut TcpStream) -> flintkv::Result<RespValue> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            return Err(FlintError::Reply(
                "connection closed before a complete reply".to_string(),
            ));
        }
        buf.extend_from_slice(&chunk[..n]);

        let mut pos = 0;
        match resp::parse(&buf, &mut pos) {
            Ok(value) => return Ok(value),
            // Frame not complete yet, keep reading
            Err(ParseError::UnexpectedEof)
            | Err(ParseError::UnterminatedLine)
            | Err(ParseError::IncompleteBulk) => continue,
            Err(e) => return Err(e.into()),
        }
    }
}
