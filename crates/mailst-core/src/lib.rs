//! # mailst-core
//!
//! Core logic of the `mailst` mail merge tool.
//!
//! This crate provides:
//! - **Typed columns** - text, name, grade and file columns binding table
//!   cells to recipient fields
//! - **Recipients** - an address plus the fields and attachments a message
//!   template can use
//! - **Sent log** - an append-only record of deliveries that makes re-runs
//!   skip recipients already mailed
//! - **Mailer** - recipient filtering, message rendering, delivery and
//!   dry-run previews
//! - **Job files** - JSON description of a run

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod address;
pub mod attachment;
pub mod column;
pub mod config;
mod error;
pub mod mailer;
pub mod recipient;
pub mod sent_log;
pub mod table;
pub mod template;
pub mod transport;
pub mod value;

pub use address::{Address, AddressError};
pub use attachment::AttachmentFile;
pub use column::{Column, ColumnError, ColumnKind, FileSpec, GradeSpec, Roles, uncapitalize};
pub use config::{JobConfig, ProcessOptions, RunMode};
pub use error::{Error, Result};
pub use mailer::{Delivery, Mailer, RenderedMessage, RunReport, SendOptions};
pub use recipient::Recipient;
pub use sent_log::{LOG_FILENAME, SentLog, SentLogError};
pub use table::{TableOptions, load_recipients, read_recipients};
pub use template::{Template, TemplateError};
pub use transport::{Envelope, Security, SmtpSettings, SmtpTransport, Transport, TransportError};
pub use value::{FieldValue, Grade};
