//! # mailst-smtp
//!
//! A small async SMTP submission client (RFC 5321) for sending many
//! messages over one relay connection.
//!
//! ## Features
//!
//! - **Type-state sessions**: a session must greet the server before it can
//!   authenticate or submit mail
//! - **TLS**: implicit TLS (port 465) and STARTTLS
//! - **Authentication**: AUTH PLAIN
//! - **Transactions**: MAIL FROM / RCPT TO / DATA with dot-stuffing,
//!   reusable for any number of messages, RSET on rejected transactions
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailst_smtp::{Client, Envelope, Security};
//!
//! let client = Client::connect("smtp.example.com", 587, Security::StartTls).await?;
//! let mut session = client.ehlo("client.example.com").await?
//!     .starttls("smtp.example.com").await?
//!     .auth_plain("user", "secret").await?;
//!
//! let envelope = Envelope::new("teacher@example.com", ["student@example.com"])?;
//! session.send(&envelope, b"Subject: Hi\r\n\r\nHello\r\n").await?;
//! session.quit().await?;
//! ```
//!
//! ## Session States
//!
//! ```text
//! Connected ── ehlo() ──→ Greeted ── auth_plain() / ready() ──→ Ready
//!                           └── starttls() ──→ Greeted
//!
//! Ready ── send()* ──→ quit()
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod capability;
mod client;
mod command;
mod envelope;
mod error;
mod reply;
mod stream;

pub use capability::Capabilities;
pub use client::{Client, Connected, Greeted, Ready};
pub use command::Command;
pub use envelope::{Envelope, Path};
pub use error::{Error, Result};
pub use reply::{Reply, ReplyCode};
pub use stream::{Duplex, Security, SmtpStream};
