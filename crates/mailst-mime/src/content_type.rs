//! MIME content type handling.

use crate::error::{Error, Result};
use std::fmt;

/// MIME content type with parameters.
///
/// Parameters keep their insertion order so generated headers are stable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Main type (e.g., "text", "application", "multipart").
    pub main_type: String,
    /// Subtype (e.g., "plain", "pdf", "mixed").
    pub sub_type: String,
    /// Parameters (e.g., charset=utf-8, boundary=xxx).
    pub parameters: Vec<(String, String)>,
}

impl ContentType {
    /// Creates a new content type.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            parameters: Vec::new(),
        }
    }

    /// Creates a text/plain content type in UTF-8.
    #[must_use]
    pub fn text_plain() -> Self {
        Self::new("text", "plain").with_parameter("charset", "utf-8")
    }

    /// Creates the generic binary content type used when nothing better is known.
    #[must_use]
    pub fn octet_stream() -> Self {
        Self::new("application", "octet-stream")
    }

    /// Creates a multipart/mixed content type with boundary.
    #[must_use]
    pub fn multipart_mixed(boundary: impl Into<String>) -> Self {
        Self::new("multipart", "mixed").with_parameter("boundary", boundary)
    }

    /// Adds a parameter, replacing an existing one with the same name.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into().to_lowercase();
        let value = value.into();
        if let Some(slot) = self.parameters.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.parameters.push((key, value));
        }
        self
    }

    /// Returns a parameter value by (case-insensitive) name.
    #[must_use]
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Returns `type/subtype` without parameters.
    #[must_use]
    pub fn essence(&self) -> String {
        format!("{}/{}", self.main_type, self.sub_type)
    }

    /// Parses a content type string.
    ///
    /// Format: `type/subtype; param1=value1; param2=value2`
    ///
    /// # Errors
    ///
    /// Returns an error if the type or subtype is missing or empty.
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = s.split(';');

        let type_str = parts.next().unwrap_or_default().trim();
        let (main_type, sub_type) = type_str
            .split_once('/')
            .ok_or_else(|| Error::InvalidContentType(format!("Missing subtype in {s:?}")))?;

        let main_type = main_type.trim().to_lowercase();
        let sub_type = sub_type.trim().to_lowercase();
        if main_type.is_empty() || sub_type.is_empty() || sub_type.contains('/') {
            return Err(Error::InvalidContentType(format!(
                "Expected type/subtype, got {s:?}"
            )));
        }

        let mut content_type = Self::new(main_type, sub_type);
        for param in parts {
            if let Some((key, value)) = param.trim().split_once('=') {
                content_type =
                    content_type.with_parameter(key.trim(), value.trim().trim_matches('"'));
            }
        }

        Ok(content_type)
    }
}

impl Default for ContentType {
    fn default() -> Self {
        Self::octet_stream()
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main_type, self.sub_type)?;

        for (key, value) in &self.parameters {
            // Quote value if it contains tspecials
            if value.is_empty()
                || value.contains(|c: char| c.is_whitespace() || "()<>@,;:\\\"/[]?=".contains(c))
            {
                write!(f, "; {key}=\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))?;
            } else {
                write!(f, "; {key}={value}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_text_plain() {
        let ct = ContentType::text_plain();
        assert_eq!(ct.essence(), "text/plain");
        assert_eq!(ct.parameter("charset"), Some("utf-8"));
        assert_eq!(ct.to_string(), "text/plain; charset=utf-8");
    }

    #[test]
    fn test_default_is_octet_stream() {
        let ct = ContentType::default();
        assert_eq!(ct.main_type, "application");
        assert_eq!(ct.sub_type, "octet-stream");
    }

    #[test]
    fn test_multipart_mixed_quotes_boundary() {
        let ct = ContentType::multipart_mixed("===abc==");
        assert_eq!(ct.parameter("boundary"), Some("===abc=="));
        assert_eq!(ct.to_string(), "multipart/mixed; boundary=\"===abc==\"");
    }

    #[test]
    fn test_parse_with_parameters() {
        let ct = ContentType::parse("Application/PDF; name=\"report.pdf\"").unwrap();
        assert_eq!(ct.main_type, "application");
        assert_eq!(ct.sub_type, "pdf");
        assert_eq!(ct.parameter("NAME"), Some("report.pdf"));
    }

    #[test]
    fn test_parse_rejects_missing_subtype() {
        assert!(ContentType::parse("application").is_err());
        assert!(ContentType::parse("application/").is_err());
        assert!(ContentType::parse("/pdf").is_err());
        assert!(ContentType::parse("a/b/c").is_err());
    }

    #[test]
    fn test_with_parameter_replaces() {
        let ct = ContentType::text_plain().with_parameter("Charset", "us-ascii");
        assert_eq!(ct.parameters.len(), 1);
        assert_eq!(ct.parameter("charset"), Some("us-ascii"));
    }
}
