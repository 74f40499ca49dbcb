//! SMTP reply types and parsing.

use crate::error::{Error, Result};

/// SMTP reply from server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Reply code (e.g., 250).
    pub code: ReplyCode,
    /// Reply text, one entry per line.
    pub lines: Vec<String>,
}

impl Reply {
    /// Returns true if this is a success reply (2xx).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code.is_success()
    }

    /// Returns the full text as a single string.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Converts a non-success reply into an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Rejected`] unless the code equals `expected`
    /// (or any 2xx code when `expected` is `None`).
    pub fn expect(self, expected: Option<ReplyCode>) -> Result<Self> {
        let accepted = expected.map_or_else(|| self.is_success(), |code| self.code == code);
        if accepted {
            Ok(self)
        } else {
            Err(Error::rejected(self.code.as_u16(), self.text()))
        }
    }

    /// Parses a reply from its raw lines (without CRLF).
    ///
    /// Single: `250 OK`. Multi: `250-First`, `250-Second`, `250 Last`.
    ///
    /// # Errors
    ///
    /// Returns an error if the reply is malformed or codes disagree.
    pub fn parse(raw: &[String]) -> Result<Self> {
        let first = raw
            .first()
            .ok_or_else(|| Error::Protocol("Empty reply".into()))?;
        let code = parse_code(first)?;

        let mut lines = Vec::with_capacity(raw.len());
        for line in raw {
            if parse_code(line)? != code {
                return Err(Error::Protocol(format!(
                    "Reply code changed mid-reply: {line}"
                )));
            }
            lines.push(line.get(4..).unwrap_or_default().to_string());
        }

        Ok(Self { code, lines })
    }
}

/// Checks if a raw line terminates a (possibly multi-line) reply.
#[must_use]
pub fn is_last_line(line: &str) -> bool {
    line.len() == 3 || (line.len() >= 4 && line.as_bytes()[3] == b' ')
}

fn parse_code(line: &str) -> Result<ReplyCode> {
    let digits = line
        .get(0..3)
        .filter(|d| d.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| Error::Protocol(format!("Malformed reply line: {line}")))?;
    if line.len() > 3 && !matches!(line.as_bytes()[3], b' ' | b'-') {
        return Err(Error::Protocol(format!("Malformed reply line: {line}")));
    }
    digits
        .parse()
        .map(ReplyCode::new)
        .map_err(|_| Error::Protocol(format!("Invalid reply code: {digits}")))
}

/// SMTP reply code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// 220 Service ready
    pub const SERVICE_READY: Self = Self(220);
    /// 221 Service closing transmission channel
    pub const CLOSING: Self = Self(221);
    /// 235 Authentication successful
    pub const AUTH_OK: Self = Self(235);
    /// 250 Requested mail action okay, completed
    pub const OK: Self = Self(250);
    /// 354 Start mail input
    pub const START_DATA: Self = Self(354);

    /// Creates a new reply code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns true if this is a success code (2xx).
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }
}

impl std::fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_single_line() {
        let reply = Reply::parse(&lines(&["250 OK"])).unwrap();
        assert_eq!(reply.code, ReplyCode::OK);
        assert_eq!(reply.lines, vec!["OK"]);
        assert!(reply.is_success());
    }

    #[test]
    fn test_parse_multi_line() {
        let reply = Reply::parse(&lines(&[
            "250-relay.example.com",
            "250-STARTTLS",
            "250 SIZE 1000",
        ]))
        .unwrap();
        assert_eq!(reply.lines, vec!["relay.example.com", "STARTTLS", "SIZE 1000"]);
        assert_eq!(reply.text(), "relay.example.com\nSTARTTLS\nSIZE 1000");
    }

    #[test]
    fn test_parse_bare_code() {
        let reply = Reply::parse(&lines(&["250"])).unwrap();
        assert_eq!(reply.lines, vec![""]);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Reply::parse(&[]).is_err());
        assert!(Reply::parse(&lines(&["25"])).is_err());
        assert!(Reply::parse(&lines(&["ABC OK"])).is_err());
        assert!(Reply::parse(&lines(&["250xOK"])).is_err());
        assert!(Reply::parse(&lines(&["250-a", "251 b"])).is_err());
    }

    #[test]
    fn test_is_last_line() {
        assert!(is_last_line("250 OK"));
        assert!(is_last_line("250"));
        assert!(!is_last_line("250-Continuing"));
    }

    #[test]
    fn test_expect() {
        let reply = Reply::parse(&lines(&["354 Go ahead"])).unwrap();
        assert!(reply.clone().expect(Some(ReplyCode::START_DATA)).is_ok());
        let err = reply.expect(None).unwrap_err();
        assert!(matches!(err, Error::Rejected { code: 354, .. }));
    }
}
