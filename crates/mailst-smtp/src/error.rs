//! Error types for SMTP operations.

use std::io;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TLS error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Server returned an error reply.
    #[error("SMTP error {code}: {message}")]
    Rejected {
        /// Reply code (e.g., 550).
        code: u16,
        /// Message text from the server.
        message: String,
    },

    /// Protocol error (malformed or unexpected reply).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Invalid envelope address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Feature not supported by the server or the stream.
    #[error("Server does not support {0}")]
    NotSupported(String),

    /// The server closed the connection.
    #[error("Connection closed by server")]
    ConnectionClosed,
}

impl Error {
    /// Creates a rejection error from a reply code and message.
    #[must_use]
    pub fn rejected(code: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            code,
            message: message.into(),
        }
    }

}
