//! Typed values bound to recipient fields.

use crate::attachment::AttachmentFile;
use rust_decimal::Decimal;
use std::fmt;

/// A grade: a decimal, or `-` for a blank cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    /// Numeric grade, keeping the scale it was written with.
    Value(Decimal),
    /// Blank input.
    Ungraded,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => write!(f, "{value}"),
            Self::Ungraded => f.write_str("-"),
        }
    }
}

/// Value of one recipient field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Text, as read or derived.
    Text(String),
    /// Grade.
    Grade(Grade),
    /// File to attach.
    Attachment(AttachmentFile),
}

impl FieldValue {
    /// Returns the grade, for grade fields.
    #[must_use]
    pub const fn as_grade(&self) -> Option<Grade> {
        match self {
            Self::Grade(grade) => Some(*grade),
            _ => None,
        }
    }

    /// Returns the attachment, for file fields.
    #[must_use]
    pub const fn as_attachment(&self) -> Option<&AttachmentFile> {
        match self {
            Self::Attachment(file) => Some(file),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Grade> for FieldValue {
    fn from(grade: Grade) -> Self {
        Self::Grade(grade)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Grade(grade) => grade.fmt(f),
            Self::Attachment(file) => write!(f, "{}", file.path().display()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_grade_display_keeps_scale() {
        let grade = Grade::Value(Decimal::from_str("7.50").unwrap());
        assert_eq!(grade.to_string(), "7.50");
        assert_eq!(Grade::Ungraded.to_string(), "-");
    }

    #[test]
    fn test_field_accessors() {
        let text = FieldValue::from("Ana");
        assert_eq!(text.to_string(), "Ana");
        assert_eq!(text.as_grade(), None);
        assert!(text.as_attachment().is_none());

        let grade = FieldValue::from(Grade::Ungraded);
        assert_eq!(grade.as_grade(), Some(Grade::Ungraded));
        assert_eq!(grade.to_string(), "-");
    }
}
