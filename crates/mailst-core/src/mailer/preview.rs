//! Human-readable previews used by dry runs.

use super::{Mailer, MissingAttachment};
use crate::address::Address;
use crate::error::{Error, Result};
use crate::recipient::Recipient;

/// A preview and the attachments it found missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    /// Rendered text, without the trailing separator.
    pub text: String,
    /// Attachments whose file does not exist.
    pub missing: Vec<MissingAttachment>,
}

impl Mailer {
    /// Describes the message `recipient` would get.
    ///
    /// # Errors
    ///
    /// Fails like [`Mailer::render`], except that attachments are only
    /// checked for existence.
    pub fn preview(&self, recipient: &Recipient) -> Result<Preview> {
        let body = self.template.render(recipient)?;
        let format = if recipient.file_keys().is_empty() {
            "NoMultipartMessage"
        } else {
            "MultipartMessage"
        };
        let cc = self
            .cc
            .iter()
            .map(Address::name_and_email)
            .collect::<std::result::Result<Vec<_>, _>>()?
            .join(",");
        let to = recipient.address().name_and_email()?;

        let mut text = format!(
            "Recipient: {to}\nFormat: {format}\nFrom: {}\nTo: {to}\n\
             Cc: {cc}\nSubject: {}\n\n{body}\n",
            self.from.name_and_email()?,
            self.subject,
        );

        let mut found = Vec::new();
        let mut missing = Vec::new();
        for (key, file) in recipient.attachments() {
            if file.exists() {
                found.push(file.descriptor());
            } else if self.error_on_missing_attachments {
                return Err(Error::MissingAttachment {
                    key: key.to_string(),
                    path: file.path().to_path_buf(),
                    recipient: recipient.to_string(),
                });
            } else {
                missing.push(MissingAttachment {
                    recipient: recipient.address().clone(),
                    key: key.to_string(),
                    path: file.path().to_path_buf(),
                });
            }
        }

        text.push('\n');
        text.push_str(&found.join("\n"));
        text.push('\n');
        let missing_lines: Vec<String> = missing
            .iter()
            .map(|m| format!("[MISSING ATTACHMENT!] {}", m.path.display()))
            .collect();
        text.push_str(&missing_lines.join("\n"));

        Ok(Preview { text, missing })
    }
}
