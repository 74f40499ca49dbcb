//! Server capabilities announced in the EHLO reply.

use crate::reply::Reply;

/// Server capabilities from the EHLO response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Server hostname from the first EHLO line.
    pub hostname: String,
    /// STARTTLS is offered.
    pub starttls: bool,
    /// Advertised AUTH mechanisms, upper-case.
    pub auth: Vec<String>,
    /// Maximum message size, if advertised with a value.
    pub max_size: Option<usize>,
    /// 8BITMIME is offered.
    pub eight_bit_mime: bool,
    /// SMTPUTF8 is offered.
    pub smtp_utf8: bool,
}

impl Capabilities {
    /// Builds capabilities from an EHLO reply (first line is the greeting).
    #[must_use]
    pub fn from_ehlo(reply: &Reply) -> Self {
        let mut caps = Self {
            hostname: reply
                .lines
                .first()
                .and_then(|line| line.split_whitespace().next())
                .unwrap_or("unknown")
                .to_string(),
            ..Self::default()
        };

        for line in reply.lines.iter().skip(1) {
            let mut words = line.split_whitespace();
            let Some(keyword) = words.next() else {
                continue;
            };
            match keyword.to_ascii_uppercase().as_str() {
                "STARTTLS" => caps.starttls = true,
                "AUTH" => caps.auth = words.map(str::to_ascii_uppercase).collect(),
                "SIZE" => {
                    caps.max_size = words.next().and_then(|s| s.parse().ok()).filter(|s| *s > 0);
                }
                "8BITMIME" => caps.eight_bit_mime = true,
                "SMTPUTF8" => caps.smtp_utf8 = true,
                _ => {}
            }
        }

        caps
    }

    /// Checks whether an AUTH mechanism is offered.
    #[must_use]
    pub fn supports_auth(&self, mechanism: &str) -> bool {
        self.auth.iter().any(|m| m.eq_ignore_ascii_case(mechanism))
    }
}
