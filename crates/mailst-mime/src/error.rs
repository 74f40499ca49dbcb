//! Errors raised while building messages.

/// Result type alias for message building.
pub type Result<T> = std::result::Result<T, Error>;

/// Message building errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A content type is not `type/subtype[; param=value]*`.
    #[error("Malformed content type: {0}")]
    InvalidContentType(String),

    /// A header name has forbidden characters or its value a line break.
    #[error("Bad header: {0}")]
    InvalidHeader(String),

    /// From or To was never set.
    #[error("Message has no {0} header")]
    MissingHeader(String),
}
