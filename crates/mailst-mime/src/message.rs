//! MIME message structure and generation.

use crate::content_type::ContentType;
use crate::encoding::{
    encode_base64_lines, encode_quoted_printable, encode_rfc2047, is_seven_bit_safe,
};
use crate::error::{Error, Result};
use crate::header::Headers;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Transfer encoding types used for generated parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Base64 encoding.
    Base64,
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Base64 => write!(f, "base64"),
        }
    }
}

/// A file to attach to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name announced to the receiver (no directory part).
    pub filename: String,
    /// Content type of the data.
    pub content_type: ContentType,
    /// Raw file contents.
    pub data: Vec<u8>,
}

impl Attachment {
    /// Creates a new attachment.
    #[must_use]
    pub fn new(filename: impl Into<String>, content_type: ContentType, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type,
            data,
        }
    }

    fn into_part(self) -> Result<Part> {
        let filename = encode_rfc2047(&self.filename).replace('"', "");
        let mut headers = Headers::new();
        headers.add("Content-Type", self.content_type.to_string())?;
        headers.add("MIME-Version", "1.0")?;
        headers.add("Content-Transfer-Encoding", TransferEncoding::Base64.to_string())?;
        headers.add(
            "Content-Disposition",
            format!("attachment; filename=\"{filename}\""),
        )?;
        Ok(Part::new(headers, encode_base64_lines(&self.data)))
    }
}

/// MIME message part with an already encoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Encoded body, CRLF line endings.
    pub body: String,
}

impl Part {
    /// Creates a new part.
    #[must_use]
    pub const fn new(headers: Headers, body: String) -> Self {
        Self { headers, body }
    }

    fn text(text: &str) -> Result<Self> {
        let (encoding, body) = encode_text(text);
        let mut headers = Headers::new();
        headers.add("Content-Type", ContentType::text_plain().to_string())?;
        headers.add("MIME-Version", "1.0")?;
        headers.add("Content-Transfer-Encoding", encoding.to_string())?;
        Ok(Self::new(headers, body))
    }
}

/// Message body layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// A single `text/plain` body.
    Single(String),
    /// A `multipart/mixed` body: text part first, then attachments.
    Multipart {
        /// Boundary separating the parts.
        boundary: String,
        /// Parts in order.
        parts: Vec<Part>,
    },
}

/// A generated MIME message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message headers.
    pub headers: Headers,
    /// Message body.
    pub body: Body,
}

impl Message {
    /// Checks if this is a multipart message.
    #[must_use]
    pub const fn is_multipart(&self) -> bool {
        matches!(self.body, Body::Multipart { .. })
    }

    /// Returns the parts of a multipart message (empty for single-part).
    #[must_use]
    pub fn parts(&self) -> &[Part] {
        match &self.body {
            Body::Single(_) => &[],
            Body::Multipart { parts, .. } => parts,
        }
    }

    /// Serializes the message in RFC 5322 wire format.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\r\n", self.headers)?;
        match &self.body {
            Body::Single(body) => f.write_str(body),
            Body::Multipart { boundary, parts } => {
                for part in parts {
                    write!(f, "--{boundary}\r\n{}\r\n{}", part.headers, part.body)?;
                    if !part.body.ends_with("\r\n") {
                        f.write_str("\r\n")?;
                    }
                }
                write!(f, "--{boundary}--\r\n")
            }
        }
    }
}

/// Builder for outgoing messages.
///
/// Address values are complete mailbox strings, see
/// [`format_mailbox`](crate::format_mailbox).
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    from: Option<String>,
    to: Vec<String>,
    cc: Vec<String>,
    subject: Option<String>,
    text: String,
    attachments: Vec<Attachment>,
    multipart: bool,
    boundary: Option<String>,
    date: Option<chrono::DateTime<chrono::Local>>,
}

impl MessageBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the From mailbox.
    #[must_use]
    pub fn from(mut self, mailbox: impl Into<String>) -> Self {
        self.from = Some(mailbox.into());
        self
    }

    /// Adds a To mailbox.
    #[must_use]
    pub fn to(mut self, mailbox: impl Into<String>) -> Self {
        self.to.push(mailbox.into());
        self
    }

    /// Adds a Cc mailbox.
    #[must_use]
    pub fn cc(mut self, mailbox: impl Into<String>) -> Self {
        self.cc.push(mailbox.into());
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets the plain text body.
    #[must_use]
    pub fn text_body(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Adds an attachment; any attachment makes the message multipart.
    #[must_use]
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self.multipart = true;
        self
    }

    /// Forces a `multipart/mixed` layout even without attachments.
    #[must_use]
    pub const fn multipart(mut self, multipart: bool) -> Self {
        self.multipart = multipart;
        self
    }

    /// Uses a fixed boundary instead of a generated one.
    #[must_use]
    pub fn boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = Some(boundary.into());
        self
    }

    /// Uses a fixed Date header instead of the current time.
    #[must_use]
    pub const fn date(mut self, date: chrono::DateTime<chrono::Local>) -> Self {
        self.date = Some(date);
        self
    }

    /// Builds the message.
    ///
    /// # Errors
    ///
    /// Returns an error if From or To is missing or a header value is invalid.
    pub fn build(self) -> Result<Message> {
        let from = self
            .from
            .ok_or_else(|| Error::MissingHeader("From".to_string()))?;
        if self.to.is_empty() {
            return Err(Error::MissingHeader("To".to_string()));
        }

        let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let date = self.date.unwrap_or_else(chrono::Local::now);

        let mut headers = Headers::new();
        headers.add("Subject", encode_rfc2047(self.subject.as_deref().unwrap_or_default()))?;
        headers.add("From", from.as_str())?;
        headers.add("To", self.to.join(", "))?;
        if !self.cc.is_empty() {
            headers.add("Cc", self.cc.join(", "))?;
        }
        headers.add("Date", date.to_rfc2822())?;
        headers.add("Message-ID", message_id(&from, date, sequence))?;

        if !self.multipart {
            let text = Part::text(&self.text)?;
            for (name, value) in text.headers.iter() {
                headers.add(name, value)?;
            }
            return Ok(Message {
                headers,
                body: Body::Single(text.body),
            });
        }

        let boundary = self.boundary.unwrap_or_else(|| {
            format!(
                "===============mailst{:016x}{sequence:04x}==",
                date.timestamp_nanos_opt().unwrap_or_default()
            )
        });
        headers.add("Content-Type", ContentType::multipart_mixed(&boundary).to_string())?;
        headers.add("MIME-Version", "1.0")?;

        let mut parts = Vec::with_capacity(self.attachments.len() + 1);
        parts.push(Part::text(&self.text)?);
        for attachment in self.attachments {
            parts.push(attachment.into_part()?);
        }

        Ok(Message {
            headers,
            body: Body::Multipart { boundary, parts },
        })
    }
}

fn encode_text(text: &str) -> (TransferEncoding, String) {
    if is_seven_bit_safe(text) {
        let mut body = text.replace("\r\n", "\n").replace('\n', "\r\n");
        if !body.ends_with("\r\n") {
            body.push_str("\r\n");
        }
        (TransferEncoding::SevenBit, body)
    } else {
        let mut body = encode_quoted_printable(text);
        body.push_str("\r\n");
        (TransferEncoding::QuotedPrintable, body)
    }
}

fn message_id(from: &str, date: chrono::DateTime<chrono::Local>, sequence: u64) -> String {
    let domain = from
        .rsplit('@')
        .next()
        .map(|d| d.trim_end_matches('>').trim())
        .filter(|d| !d.is_empty() && *d != from)
        .unwrap_or("localhost");
    format!("<{}.{sequence}.mailst@{domain}>", date.timestamp_micros())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_date() -> chrono::DateTime<chrono::Local> {
        chrono::Local.with_ymd_and_hms(2024, 6, 3, 10, 30, 0).unwrap()
    }

    #[test]
    fn test_single_part_message() {
        let message = MessageBuilder::new()
            .from("Teacher <teacher@example.com>")
            .to("student@example.com")
            .subject("Grades")
            .text_body("Your grade: 7.5\n")
            .date(fixed_date())
            .build()
            .unwrap();

        assert!(!message.is_multipart());
        assert!(message.parts().is_empty());
        let wire = message.to_string();
        assert!(wire.starts_with(
            "Subject: Grades\r\nFrom: Teacher <teacher@example.com>\r\nTo: student@example.com\r\n"
        ));
        assert!(wire.contains("Content-Type: text/plain; charset=utf-8\r\n"));
        assert!(wire.contains("Content-Transfer-Encoding: 7bit\r\n"));
        assert!(wire.contains("Message-ID: <"));
        assert!(wire.contains("@example.com>\r\n"));
        assert!(wire.ends_with("\r\n\r\nYour grade: 7.5\r\n"));
    }

    #[test]
    fn test_non_ascii_text_uses_quoted_printable() {
        let message = MessageBuilder::new()
            .from("a@example.com")
            .to("b@example.com")
            .subject("Calificación")
            .text_body("Hola Begoña")
            .build()
            .unwrap();

        let wire = message.to_string();
        assert!(wire.contains("Subject: =?utf-8?B?"));
        assert!(wire.contains("Content-Transfer-Encoding: quoted-printable\r\n"));
        assert!(wire.contains("Hola Bego=C3=B1a"));
    }

    #[test]
    fn test_multipart_with_attachment() {
        let message = MessageBuilder::new()
            .from("a@example.com")
            .to("b@example.com")
            .cc("c@example.com")
            .cc("d@example.com")
            .subject("Report")
            .text_body("See attached")
            .attach(Attachment::new(
                "report.pdf",
                ContentType::new("application", "pdf"),
                b"%PDF-1.4".to_vec(),
            ))
            .boundary("XYZ")
            .build()
            .unwrap();

        assert!(message.is_multipart());
        assert_eq!(message.parts().len(), 2);
        let wire = message.to_string();
        assert!(wire.contains("Cc: c@example.com, d@example.com\r\n"));
        assert!(wire.contains("Content-Type: multipart/mixed; boundary=XYZ\r\n"));
        assert!(wire.contains("--XYZ\r\nContent-Type: text/plain; charset=utf-8\r\n"));
        assert!(wire.contains("Content-Disposition: attachment; filename=\"report.pdf\"\r\n"));
        assert!(wire.contains("JVBERi0xLjQ=\r\n"));
        assert!(wire.ends_with("--XYZ--\r\n"));
    }

    #[test]
    fn test_forced_multipart_without_attachments() {
        let message = MessageBuilder::new()
            .from("a@example.com")
            .to("b@example.com")
            .text_body("Only text")
            .multipart(true)
            .build()
            .unwrap();

        assert!(message.is_multipart());
        assert_eq!(message.parts().len(), 1);
    }

    #[test]
    fn test_missing_from_or_to() {
        assert!(matches!(
            MessageBuilder::new().to("b@example.com").build(),
            Err(Error::MissingHeader(h)) if h == "From"
        ));
        assert!(matches!(
            MessageBuilder::new().from("a@example.com").build(),
            Err(Error::MissingHeader(h)) if h == "To"
        ));
    }

    #[test]
    fn test_generated_boundaries_differ() {
        let build = || {
            MessageBuilder::new()
                .from("a@example.com")
                .to("b@example.com")
                .multipart(true)
                .date(fixed_date())
                .build()
                .unwrap()
        };
        let first = build();
        let second = build();
        let boundary = |m: &Message| match &m.body {
            Body::Multipart { boundary, .. } => boundary.clone(),
            Body::Single(_) => String::new(),
        };
        assert_ne!(boundary(&first), boundary(&second));
    }

    #[test]
    fn test_message_id_domain() {
        assert_eq!(
            message_id("Teacher <t@uni.example>", fixed_date(), 7),
            format!("<{}.7.mailst@uni.example>", fixed_date().timestamp_micros())
        );
        assert!(message_id("nobody", fixed_date(), 1).ends_with("@localhost>"));
    }
}
