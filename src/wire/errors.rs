//! Wire protocol errors
//!
//! Error codes:
//! - WIRE_IO_FAILED
//! - WIRE_FRAME_TOO_LARGE
//! - WIRE_CONNECTION_CLOSED
//! - WIRE_CONNECT_FAILED
//! - WIRE_SPAWN_FAILED
//!
//! Wire errors are scoped to one connection. They abort the worker that owns
//! the connection and nothing else.

use std::io;

use thiserror::Error;

/// Result type for wire operations
pub type WireResult<T> = Result<T, WireError>;

/// Errors raised by the codec and transports
#[derive(Debug, Error)]
pub enum WireError {
    /// Socket or pipe I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Payload does not fit in the 4-byte length header
    #[error("payload of {0} bytes exceeds the maximum frame size")]
    FrameTooLarge(usize),

    /// Peer closed the connection before a complete frame arrived
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// TCP connect failed
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Controller process could not be started
    #[error("failed to spawn controller '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl WireError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            WireError::Io(_) => "WIRE_IO_FAILED",
            WireError::FrameTooLarge(_) => "WIRE_FRAME_TOO_LARGE",
            WireError::ConnectionClosed => "WIRE_CONNECTION_CLOSED",
            WireError::Connect { .. } => "WIRE_CONNECT_FAILED",
            WireError::Spawn { .. } => "WIRE_SPAWN_FAILED",
        }
    }
}
