//! Mail participants.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Characters that force a display name to be quoted.
const SPECIALS: &str = "()<>[]:;@\\,.\"";

/// Errors raised while rendering or parsing an [`Address`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    /// The address has no email.
    #[error("The recipient has no email address")]
    MissingAddress,

    /// The text is not a recognizable address.
    #[error("Invalid address: {0:?}")]
    Invalid(String),
}

/// An email plus an optional display name.
///
/// Two addresses are equal when their emails are equal, whatever their
/// display names. Comparison is exact and case-sensitive.
#[derive(Debug, Clone, Default)]
pub struct Address {
    email: Option<String>,
    full_name: Option<String>,
}

impl Address {
    /// Creates an address without a display name.
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            full_name: None,
        }
    }

    /// Creates an address with a display name.
    #[must_use]
    pub fn with_name(email: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            full_name: Some(full_name.into()),
        }
    }

    /// Returns the email, if set.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the display name, if set.
    #[must_use]
    pub fn full_name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }

    pub(crate) fn set_email(&mut self, email: impl Into<String>) {
        self.email = Some(email.into());
    }

    pub(crate) fn set_full_name(&mut self, full_name: impl Into<String>) {
        self.full_name = Some(full_name.into());
    }

    /// Renders `Name <email>`, or the bare email without a display name.
    ///
    /// Names containing specials are quoted with `\` and `"` escaped.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::MissingAddress`] if there is no email.
    pub fn name_and_email(&self) -> Result<String, AddressError> {
        let email = self.require_email()?;
        Ok(match self.display_name() {
            None => email.to_string(),
            Some(name) if name.contains(|c: char| SPECIALS.contains(c)) => {
                let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
                format!("\"{escaped}\" <{email}>")
            }
            Some(name) => format!("{name} <{email}>"),
        })
    }

    /// Renders the mailbox for a message header, encoding non-ASCII names.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::MissingAddress`] if there is no email.
    pub fn header_mailbox(&self) -> Result<String, AddressError> {
        let email = self.require_email()?;
        Ok(mailst_mime::format_mailbox(self.display_name(), email))
    }

    /// Returns the email or fails with [`AddressError::MissingAddress`].
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::MissingAddress`] if there is no email.
    pub fn require_email(&self) -> Result<&str, AddressError> {
        self.email
            .as_deref()
            .filter(|e| !e.is_empty())
            .ok_or(AddressError::MissingAddress)
    }

    fn display_name(&self) -> Option<&str> {
        self.full_name.as_deref().filter(|n| !n.is_empty())
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.email == other.email
    }
}

impl Eq for Address {}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.email.hash(state);
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name_and_email() {
            Ok(rendered) => f.write_str(&rendered),
            Err(_) => write!(f, "{} <no email>", self.full_name().unwrap_or_default()),
        }
    }
}

impl FromStr for Address {
    type Err = AddressError;

    /// Parses `Name <email>`, `"Quoted, Name" <email>`, `<email>` or `email`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || AddressError::Invalid(s.to_string());

        let (name, email) = match s.rfind('<') {
            Some(open) => {
                let email = s[open + 1..].strip_suffix('>').ok_or_else(invalid)?;
                (unquote(s[..open].trim()), email.trim())
            }
            None => (String::new(), s),
        };

        if email.is_empty() || !email.contains('@') || email.contains(char::is_whitespace) {
            return Err(invalid());
        }

        Ok(if name.is_empty() {
            Self::new(email)
        } else {
            Self::with_name(email, name)
        })
    }
}

fn unquote(name: &str) -> String {
    let Some(inner) = name.strip_prefix('"').and_then(|n| n.strip_suffix('"')) else {
        return name.to_string();
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}
