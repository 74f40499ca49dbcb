//! SMTP command serialization.

use crate::envelope::Path;

/// SMTP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// EHLO - Extended greeting
    Ehlo {
        /// Client hostname
        hostname: String,
    },
    /// STARTTLS - Upgrade to TLS
    StartTls,
    /// AUTH PLAIN with an initial response (SASL-IR)
    AuthPlain {
        /// Base64 encoded `\0user\0password`
        initial_response: String,
    },
    /// MAIL FROM - Start mail transaction
    MailFrom {
        /// Reverse path
        from: Path,
        /// Request `BODY=8BITMIME`
        eight_bit: bool,
        /// Announced message size
        size: Option<usize>,
    },
    /// RCPT TO - Add recipient
    RcptTo {
        /// Forward path
        to: Path,
    },
    /// DATA - Begin message data
    Data,
    /// RSET - Abort the current transaction
    Rset,
    /// QUIT - Close connection
    Quit,
}

impl Command {
    /// Serializes the command, including the trailing CRLF.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let line = match self {
            Self::Ehlo { hostname } => format!("EHLO {hostname}"),
            Self::StartTls => "STARTTLS".to_string(),
            Self::AuthPlain { initial_response } => format!("AUTH PLAIN {initial_response}"),
            Self::MailFrom {
                from,
                eight_bit,
                size,
            } => {
                let mut line = format!("MAIL FROM:<{from}>");
                if *eight_bit {
                    line.push_str(" BODY=8BITMIME");
                }
                if let Some(size) = size {
                    line.push_str(&format!(" SIZE={size}"));
                }
                line
            }
            Self::RcptTo { to } => format!("RCPT TO:<{to}>"),
            Self::Data => "DATA".to_string(),
            Self::Rset => "RSET".to_string(),
            Self::Quit => "QUIT".to_string(),
        };

        let mut buf = line.into_bytes();
        buf.extend_from_slice(b"\r\n");
        buf
    }

    /// Short name used in logs; never includes credentials.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Ehlo { .. } => "EHLO",
            Self::StartTls => "STARTTLS",
            Self::AuthPlain { .. } => "AUTH",
            Self::MailFrom { .. } => "MAIL",
            Self::RcptTo { .. } => "RCPT",
            Self::Data => "DATA",
            Self::Rset => "RSET",
            Self::Quit => "QUIT",
        }
    }
}
