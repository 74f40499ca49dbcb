//! # mailst-mime
//!
//! MIME message generation for personalized bulk email.
//!
//! ## Features
//!
//! - **Message generation**: single-part `text/plain` or `multipart/mixed`
//!   messages with file attachments
//! - **Header encoding**: RFC 2047 encoded words for non-ASCII subjects and
//!   display names
//! - **Body encoding**: Base64 for attachments, Quoted-Printable for text
//!   that is not plain 7-bit
//! - **Content types**: `type/subtype; param=value` parsing and formatting
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailst_mime::{Attachment, ContentType, MessageBuilder};
//!
//! let message = MessageBuilder::new()
//!     .from("Teacher <teacher@example.com>")
//!     .to("student@example.com")
//!     .subject("Your grade")
//!     .text_body("Hello, your grade is 7.5")
//!     .attach(Attachment::new("report.pdf", ContentType::new("application", "pdf"), bytes))
//!     .build()?;
//!
//! let wire = message.to_bytes();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content_type;
mod error;
mod header;
mod message;

pub mod encoding;

pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::{Headers, format_mailbox};
pub use message::{Attachment, Body, Message, MessageBuilder, Part, TransferEncoding};
