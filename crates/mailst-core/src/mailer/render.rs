//! Message construction for one recipient.

use super::Mailer;
use crate::address::Address;
use crate::error::{Error, Result};
use crate::recipient::Recipient;
use crate::transport::{Envelope, TransportError};
use mailst_mime::{Message, MessageBuilder};
use std::io;
use std::path::PathBuf;
use tracing::warn;

/// An attachment left out of a message because its file does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingAttachment {
    /// The recipient the message was built for.
    pub recipient: Address,
    /// Key of the file column.
    pub key: String,
    /// Path that was not found.
    pub path: PathBuf,
}

/// A message ready for the transport.
#[derive(Debug, Clone)]
pub struct RenderedMessage {
    /// The MIME message.
    pub message: Message,
    /// Envelope sender and recipients.
    pub envelope: Envelope,
    /// Attachments that were omitted.
    pub missing: Vec<MissingAttachment>,
}

impl Mailer {
    /// Builds the message for `recipient`.
    ///
    /// With `alt_to`, the message goes to that address instead and carries
    /// no Cc.
    ///
    /// # Errors
    ///
    /// Fails when the template references an unknown field, an address has
    /// no email, or an attachment is missing and missing attachments are
    /// fatal.
    pub fn render(
        &self,
        recipient: &Recipient,
        alt_to: Option<&Address>,
    ) -> Result<RenderedMessage> {
        let body = self.template.render(recipient)?;
        let to = alt_to.unwrap_or_else(|| recipient.address());

        let mut builder = MessageBuilder::new()
            .subject(&self.subject)
            .from(self.from.header_mailbox()?)
            .to(to.header_mailbox()?)
            .text_body(body)
            .multipart(!recipient.file_keys().is_empty());

        let mut envelope_to = vec![to.require_email()?.to_string()];
        if alt_to.is_none() {
            for cc in &self.cc {
                builder = builder.cc(cc.header_mailbox()?);
                envelope_to.push(cc.require_email()?.to_string());
            }
        }

        let mut missing = Vec::new();
        for (key, file) in recipient.attachments() {
            match file.to_mime() {
                Ok(attachment) => builder = builder.attach(attachment),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    if self.error_on_missing_attachments {
                        return Err(Error::MissingAttachment {
                            key: key.to_string(),
                            path: file.path().to_path_buf(),
                            recipient: recipient.to_string(),
                        });
                    }
                    warn!(
                        "Warning: Attachment {} not found for {key} in email to {recipient}",
                        file.path().display()
                    );
                    missing.push(MissingAttachment {
                        recipient: recipient.address().clone(),
                        key: key.to_string(),
                        path: file.path().to_path_buf(),
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }

        let envelope = Envelope::new(self.from.require_email()?, envelope_to)
            .map_err(TransportError::from)?;

        Ok(RenderedMessage {
            message: builder.build()?,
            envelope,
            missing,
        })
    }
}
