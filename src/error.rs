//! Error types for FlintKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using FlintError
pub type Result<T> = std::result::Result<T, FlintError>;

/// Unified error type for FlintKV operations
#[derive(Debug, Error)]
pub enum FlintError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(#[from] crate::resp::ParseError),

    #[error("Unexpected reply: {0}")]
    Reply(String),

    // -------------------------------------------------------------------------
    // Server Errors
    // -------------------------------------------------------------------------
    #[error("Setup error: {0}")]
    Setup(String),

    #[error("Reactor error: {0}")]
    Reactor(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
