//! Append-only log of delivered messages.
//!
//! Each line of the file is one event:
//!
//! ```text
//! ana@example.com,send,2024-06-03T10:15:02.512993
//! ana@example.com,forget,2024-06-04T09:00:00
//! ```
//!
//! Replaying the events in order gives the set of addresses already mailed.
//! Lines with only `email,timestamp` come from older versions and count as
//! `send` events. The file is never rewritten.

use crate::address::Address;
use chrono::{DateTime, Local, NaiveDateTime, SubsecRound};
use std::collections::HashMap;
use std::fmt;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// Default log file, relative to the working directory.
pub const LOG_FILENAME: &str = ".mailst-sentlog.csv";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Errors raised while loading or appending to the sent log.
#[derive(Debug, thiserror::Error)]
pub enum SentLogError {
    /// The log file could not be opened or written.
    #[error("Sent log I/O error: {0}")]
    Io(#[from] io::Error),

    /// The log file is not valid CSV.
    #[error("Sent log CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A line could not be understood.
    #[error("Malformed sent log line {line}: {reason}")]
    Malformed {
        /// 1-based line number.
        line: u64,
        /// What is wrong.
        reason: String,
    },
}

/// Event kind stored on each line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// The message was delivered.
    Send,
    /// An earlier delivery should be disregarded.
    Forget,
}

impl Action {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Send => "send",
            Self::Forget => "forget",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "send" => Ok(Self::Send),
            "forget" => Ok(Self::Forget),
            other => Err(format!("unknown action {other:?}")),
        }
    }
}

/// Sent log: the replayed state plus the file it is appended to.
#[derive(Debug, Clone)]
pub struct SentLog {
    path: PathBuf,
    sent_to: HashMap<String, NaiveDateTime>,
}

impl SentLog {
    /// Opens the log at `path`, replaying the file if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SentLogError> {
        let mut log = Self {
            path: path.into(),
            sent_to: HashMap::new(),
        };

        if log.path.exists() {
            log.replay()?;
            info!(
                "Loaded {} sent email records from the log file.",
                log.sent_to.len()
            );
        } else {
            info!("No log file found. Starting with an empty log.");
        }

        Ok(log)
    }

    fn replay(&mut self) -> Result<(), SentLogError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&self.path)?;

        for (index, record) in reader.records().enumerate() {
            let record = record?;
            let line = record
                .position()
                .map_or(index as u64 + 1, csv::Position::line);
            let malformed = |reason: String| SentLogError::Malformed { line, reason };

            let (email, action, timestamp) = match record.len() {
                1 if record[0].is_empty() => continue,
                2 => (&record[0], Action::Send, &record[1]),
                3 => (&record[0], record[1].parse().map_err(malformed)?, &record[2]),
                n => return Err(malformed(format!("expected 2 or 3 fields, found {n}"))),
            };
            if email.is_empty() {
                return Err(malformed("empty email".to_string()));
            }
            let timestamp = parse_timestamp(timestamp)
                .ok_or_else(|| malformed(format!("invalid timestamp {timestamp:?}")))?;

            match action {
                Action::Send => {
                    self.sent_to.insert(email.to_string(), timestamp);
                }
                Action::Forget => {
                    self.sent_to.remove(email);
                }
            }
        }
        Ok(())
    }

    /// Checks whether the address has an outstanding send.
    #[must_use]
    pub fn contains(&self, address: &Address) -> bool {
        address
            .email()
            .is_some_and(|email| self.sent_to.contains_key(email))
    }

    /// Time of the outstanding send to `email`.
    #[must_use]
    pub fn sent_at(&self, email: &str) -> Option<NaiveDateTime> {
        self.sent_to.get(email).copied()
    }

    /// Records a delivery and appends it to the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be appended to; the in-memory
    /// state is left unchanged in that case.
    pub fn record_send(&mut self, email: &str, at: NaiveDateTime) -> Result<(), SentLogError> {
        let at = at.trunc_subsecs(6);
        self.append(email, Action::Send, at)?;
        self.sent_to.insert(email.to_string(), at);
        Ok(())
    }

    /// Disregards the delivery to `email`, appending a `forget` event.
    ///
    /// Returns whether a delivery was recorded. The event is written either
    /// way.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be appended to.
    pub fn forget(&mut self, email: &str, at: NaiveDateTime) -> Result<bool, SentLogError> {
        self.append(email, Action::Forget, at.trunc_subsecs(6))?;
        Ok(self.sent_to.remove(email).is_some())
    }

    /// Number of addresses with an outstanding send.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sent_to.len()
    }

    /// True when no address has an outstanding send.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sent_to.is_empty()
    }

    /// Outstanding sends, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<(&str, NaiveDateTime)> {
        let mut entries: Vec<_> = self
            .sent_to
            .iter()
            .map(|(email, at)| (email.as_str(), *at))
            .collect();
        entries.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        entries
    }

    /// Path of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, email: &str, action: Action, at: NaiveDateTime) -> Result<(), SentLogError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        let timestamp = at.format(TIMESTAMP_FORMAT).to_string();
        writer.write_record([email, action.as_str(), timestamp.as_str()])?;
        writer.flush()?;
        debug!("Logged {action} for {email} in {}", self.path.display());
        Ok(())
    }
}

/// Parses a log timestamp.
///
/// Accepts `YYYY-MM-DDTHH:MM:SS[.f]`, the same with a space separator, and
/// RFC 3339 with an offset (converted to local time).
fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Local).naive_local())
        })
}
