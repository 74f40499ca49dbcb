//! Error types for the core library.

use crate::address::AddressError;
use crate::column::ColumnError;
use crate::sent_log::SentLogError;
use crate::template::TemplateError;
use crate::transport::TransportError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A column was misdeclared or a cell could not be bound.
    #[error(transparent)]
    Column(#[from] ColumnError),

    /// A table record could not be bound.
    #[error("Recipient record {record}: {source}")]
    Record {
        /// 1-based record number, not counting the header.
        record: u64,
        /// The binding error.
        #[source]
        source: ColumnError,
    },

    /// An address is missing or malformed.
    #[error(transparent)]
    Address(#[from] AddressError),

    /// The body template is invalid or names an unknown field.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The sent log could not be read or appended to.
    #[error(transparent)]
    SentLog(#[from] SentLogError),

    /// The relay refused a message or the connection failed.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The message could not be built.
    #[error("MIME error: {0}")]
    Mime(#[from] mailst_mime::Error),

    /// A file column points to a file that does not exist.
    #[error("Attachment {} not found for {key} in email to {recipient}", path.display())]
    MissingAttachment {
        /// Column key.
        key: String,
        /// Resolved path.
        path: PathBuf,
        /// Recipient display form.
        recipient: String,
    },

    /// The recipient table is not valid CSV.
    #[error("Recipient table error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
