//! Files attached to outgoing messages.

use mailst_mime::{Attachment, ContentType};
use std::io;
use std::path::{Path, PathBuf};

/// A file referenced by a file column.
///
/// Existence is only checked when the message is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentFile {
    path: PathBuf,
    content_type: ContentType,
}

impl AttachmentFile {
    /// Creates an attachment; without a content type it is sent as
    /// `application/octet-stream`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, content_type: Option<ContentType>) -> Self {
        Self {
            path: path.into(),
            content_type: content_type.unwrap_or_default(),
        }
    }

    /// Resolved path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Content type of the part.
    #[must_use]
    pub const fn content_type(&self) -> &ContentType {
        &self.content_type
    }

    /// Main MIME type, e.g. `application`.
    #[must_use]
    pub fn main_type(&self) -> &str {
        &self.content_type.main_type
    }

    /// MIME subtype, e.g. `pdf`.
    #[must_use]
    pub fn sub_type(&self) -> &str {
        &self.content_type.sub_type
    }

    /// Checks whether the file is present.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// File name without directories, as announced to the receiver.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map_or_else(|| self.path.display().to_string(), |n| n.to_string_lossy().into_owned())
    }

    /// Reads the file contents.
    ///
    /// # Errors
    ///
    /// Returns the I/O error, `NotFound` for a missing file.
    pub fn read(&self) -> io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }

    /// Builds the MIME attachment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn to_mime(&self) -> io::Result<Attachment> {
        Ok(Attachment::new(
            self.file_name(),
            self.content_type.clone(),
            self.read()?,
        ))
    }

    /// One-line description used in previews: `Attachment <path> [main/sub]`.
    #[must_use]
    pub fn descriptor(&self) -> String {
        format!(
            "Attachment {} [{}/{}]",
            self.path.display(),
            self.main_type(),
            self.sub_type()
        )
    }
}
