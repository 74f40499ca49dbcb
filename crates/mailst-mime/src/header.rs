//! MIME header handling.

use crate::encoding::encode_rfc2047;
use crate::error::{Error, Result};
use std::fmt;

/// Characters that force a display name to be quoted (RFC 5322 specials).
const SPECIALS: &str = "()<>[]:;@\\,.\"";

/// Ordered collection of email headers.
///
/// Names keep the spelling they were added with; lookups are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    headers: Vec<(String, String)>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header value.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not a valid field name or the value
    /// contains a line break.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let name = name.into();
        let value = value.into();
        validate(&name, &value)?;
        self.headers.push((name, value));
        Ok(())
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns an iterator over all headers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.headers {
            write!(f, "{name}: {value}\r\n")?;
        }
        Ok(())
    }
}

fn validate(name: &str, value: &str) -> Result<()> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_graphic() && b != b':') {
        return Err(Error::InvalidHeader(format!("Bad header name: {name:?}")));
    }
    if value.contains(&['\r', '\n'][..]) {
        return Err(Error::InvalidHeader(format!(
            "Line break in value of {name}"
        )));
    }
    Ok(())
}

/// Formats a mailbox for an address header.
///
/// Produces the bare address without a display name, otherwise
/// `Name <address>`. ASCII names containing specials are quoted; non-ASCII
/// names become RFC 2047 encoded words.
#[must_use]
pub fn format_mailbox(name: Option<&str>, address: &str) -> String {
    match name.filter(|n| !n.is_empty()) {
        None => address.to_string(),
        Some(name) if !name.is_ascii() => format!("{} <{address}>", encode_rfc2047(name)),
        Some(name) if name.contains(|c: char| SPECIALS.contains(c)) => {
            let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
            format!("\"{escaped}\" <{address}>")
        }
        Some(name) => format!("{name} <{address}>"),
    }
}
