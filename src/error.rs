//! Error types for mpdlink
//!
//! Provides a unified error type for all operations, split along the
//! recovery boundary: fatal errors force a full connection reset,
//! everything else leaves the connection usable.

use thiserror::Error;

/// Result type alias using MpdError
pub type Result<T> = std::result::Result<T, MpdError>;

/// Unified error type for mpdlink operations
#[derive(Debug, Error)]
pub enum MpdError {
    // -------------------------------------------------------------------------
    // Connection Errors (fatal)
    // -------------------------------------------------------------------------
    #[error("connection error: {0}")]
    Connection(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors (fatal)
    // -------------------------------------------------------------------------
    #[error("protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Command Errors (connection stays usable)
    // -------------------------------------------------------------------------
    /// Server replied with an `ACK` line, or a client-side argument
    /// validation failed before anything was written to the wire.
    #[error("command error: {0}")]
    Command(String),

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    // -------------------------------------------------------------------------
    // Sequencing Errors (caller logic error, connection stays usable)
    // -------------------------------------------------------------------------
    #[error("command list error: {0}")]
    CommandList(String),

    #[error("pending command error: {0}")]
    Pending(String),

    #[error("iterating error: {0}")]
    Iterating(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),
}

impl MpdError {
    /// Whether this error invalidates the connection.
    ///
    /// Fatal errors (transport lost, malformed handshake, response shape
    /// violations, short binary reads) cannot be recovered in-protocol;
    /// the client tears down all transport state before surfacing them.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MpdError::Connection(_) | MpdError::Io(_) | MpdError::Protocol(_)
        )
    }
}
