//! Recipients bound from one table row.

use crate::address::Address;
use crate::attachment::AttachmentFile;
use crate::column::{Column, ColumnError};
use crate::value::FieldValue;
use std::fmt;

/// One addressee with its template fields and attachments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipient {
    address: Address,
    fields: Vec<(String, FieldValue)>,
    file_keys: Vec<String>,
    excluded: bool,
}

impl Recipient {
    /// Creates a recipient with no fields and no address.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `values` to `columns` positionally.
    ///
    /// Only as many pairs as the shorter list holds are bound; extra columns
    /// or values are ignored.
    ///
    /// # Errors
    ///
    /// Returns the first binding error.
    pub fn build<S: AsRef<str>>(columns: &[Column], values: &[S]) -> Result<Self, ColumnError> {
        let mut recipient = Self::new();
        for (column, value) in columns.iter().zip(values) {
            recipient.set_column(column, value.as_ref())?;
        }
        Ok(recipient)
    }

    /// Binds one cell. Fields with an existing key are overwritten.
    ///
    /// # Errors
    ///
    /// Returns the column's binding error.
    pub fn set_column(&mut self, column: &Column, raw: &str) -> Result<(), ColumnError> {
        let fields = column.bind(raw)?;

        if let Some((_, last)) = fields.last() {
            if column.is_full_name() {
                self.address.set_full_name(last.to_string());
            } else if column.is_email() {
                self.address.set_email(last.to_string());
            } else if column.is_file() {
                self.file_keys.push(column.key().to_string());
            }
        }

        for (key, value) in fields {
            match self.fields.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => self.fields.push((key, value)),
            }
        }
        Ok(())
    }

    /// Looks a field up by name.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// All fields in binding order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Keys of the file columns bound to this recipient, in order.
    #[must_use]
    pub fn file_keys(&self) -> &[String] {
        &self.file_keys
    }

    /// Attachments in file column order, with the key that produced each.
    ///
    /// A key whose field was later overwritten by a non-file column is
    /// skipped.
    #[must_use]
    pub fn attachments(&self) -> Vec<(&str, &AttachmentFile)> {
        self.file_keys
            .iter()
            .filter_map(|key| {
                self.field(key)
                    .and_then(FieldValue::as_attachment)
                    .map(|file| (key.as_str(), file))
            })
            .collect()
    }

    /// The recipient address.
    #[must_use]
    pub const fn address(&self) -> &Address {
        &self.address
    }

    /// Whether the recipient is manually excluded from every run.
    #[must_use]
    pub const fn exclude(&self) -> bool {
        self.excluded
    }

    /// Marks the recipient as manually excluded.
    pub const fn set_excluded(&mut self, excluded: bool) {
        self.excluded = excluded;
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.address.fmt(f)
    }
}
