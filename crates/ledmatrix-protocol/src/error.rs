//! Error types for the LED matrix protocol.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while decoding messages or moving them over a socket.
#[derive(Error, Debug)]
pub enum Error {
    /// Empty message, unknown type byte, wrong length or unexpected type.
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Endpoint string or path that does not name a local socket.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// No reply within the socket timeout.
    #[error("No reply from {0}")]
    Timeout(String),

    /// ZeroMQ socket error.
    #[error("Socket error: {0}")]
    Transport(#[from] zmq::Error),
}
