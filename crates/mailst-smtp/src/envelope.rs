//! SMTP envelope types.

use crate::error::{Error, Result};
use std::fmt;

/// Mailbox path used in `MAIL FROM` and `RCPT TO`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path(String);

impl Path {
    /// Creates a path from a bare address (no display name, no brackets).
    ///
    /// # Errors
    ///
    /// Returns an error if the address is not of the form `local@domain` or
    /// contains characters that would break the command line.
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();

        let Some((local, domain)) = addr.rsplit_once('@') else {
            return Err(Error::InvalidAddress(format!("{addr:?} must contain @")));
        };
        if local.is_empty() || domain.is_empty() {
            return Err(Error::InvalidAddress(format!(
                "{addr:?} has an empty local or domain part"
            )));
        }
        if addr
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '<' || c == '>')
        {
            return Err(Error::InvalidAddress(format!(
                "{addr:?} contains forbidden characters"
            )));
        }

        Ok(Self(addr))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sender and recipients of one mail transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Reverse path.
    pub from: Path,
    /// Forward paths, at least one.
    pub to: Vec<Path>,
}

impl Envelope {
    /// Creates an envelope from bare addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if an address is invalid or there are no recipients.
    pub fn new<I, S>(from: impl Into<String>, to: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let from = Path::new(from)?;
        let to = to.into_iter().map(Path::new).collect::<Result<Vec<_>>>()?;
        if to.is_empty() {
            return Err(Error::InvalidAddress("No recipients specified".into()));
        }
        Ok(Self { from, to })
    }
}
