//! Job files.
//!
//! A job is a JSON document describing one mail merge: the relay, the
//! message, the recipient table and how its columns are typed. Relative
//! paths are resolved against the directory holding the job file.

use crate::address::Address;
use crate::column::{Column, ColumnError, ColumnKind, FileSpec, GradeSpec, Roles};
use crate::error::{Error, Result};
use crate::mailer::{Mailer, SendOptions};
use crate::recipient::Recipient;
use crate::sent_log::{LOG_FILENAME, SentLog};
use crate::table::{TableOptions, load_recipients};
use crate::template::Template;
use crate::transport::{Security, SmtpSettings};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Environment variable consulted when the job has no SMTP password.
pub const PASSWORD_ENV: &str = "MAILST_SMTP_PASSWORD";

/// Connection security as written in job files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityMode {
    /// Plain connection.
    #[default]
    None,
    /// STARTTLS upgrade after a plain connect.
    StartTls,
    /// Implicit TLS.
    Tls,
}

impl From<SecurityMode> for Security {
    fn from(mode: SecurityMode) -> Self {
        match mode {
            SecurityMode::None => Self::None,
            SecurityMode::StartTls => Self::StartTls,
            SecurityMode::Tls => Self::Tls,
        }
    }
}

/// SMTP relay configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// Relay hostname.
    pub host: String,
    /// Relay port (default: 25, 587 for STARTTLS, 465 for TLS).
    #[serde(default)]
    pub port: Option<u16>,
    /// Security mode.
    #[serde(default)]
    pub security: SecurityMode,
    /// Username for AUTH PLAIN.
    #[serde(default)]
    pub username: Option<String>,
    /// Password for AUTH PLAIN.
    #[serde(default)]
    pub password: Option<String>,
    /// Name announced in EHLO.
    #[serde(default)]
    pub hello_name: Option<String>,
}

impl SmtpConfig {
    /// Resolves the relay settings, reading the password from
    /// [`PASSWORD_ENV`] when the job has none.
    #[must_use]
    pub fn settings(&self) -> SmtpSettings {
        let mut settings = SmtpSettings::new(&self.host);
        settings.port = self.port;
        settings.security = self.security.into();
        settings.username.clone_from(&self.username);
        settings.password = self
            .password
            .clone()
            .or_else(|| std::env::var(PASSWORD_ENV).ok());
        if let Some(name) = &self.hello_name {
            settings.hello_name.clone_from(name);
        }
        settings
    }
}

/// Recipient table location and layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientsConfig {
    /// CSV file.
    pub path: PathBuf,
    /// Field delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Whether the first row holds column titles.
    #[serde(default = "default_true")]
    pub has_headers: bool,
}

/// Column types in job files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Plain text.
    #[default]
    Text,
    /// Person name.
    Name,
    /// Grade.
    Grade,
    /// Attachment.
    File,
}

/// One column of the recipient table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Field name used in templates.
    pub key: String,
    /// How cells are bound.
    #[serde(rename = "type", default)]
    pub kind: ColumnType,
    /// The cell is the recipient email.
    #[serde(default)]
    pub email: bool,
    /// The cell is the recipient display name.
    #[serde(default)]
    pub full_name: bool,
    /// Grade maximum.
    #[serde(default)]
    pub max: Option<Decimal>,
    /// Grade minimum; `null` disables the check.
    #[serde(default = "default_min")]
    pub min: Option<Decimal>,
    /// Reject grades above the maximum.
    #[serde(default = "default_true")]
    pub check_max: bool,
    /// Directory the file names are relative to.
    #[serde(default)]
    pub base_path: Option<PathBuf>,
    /// File name template, `{}` standing for the cell.
    #[serde(default)]
    pub filename_template: Option<String>,
    /// Attachment content type.
    #[serde(default)]
    pub content_type: Option<String>,
}

impl ColumnSpec {
    /// Builds the column, resolving `base_path` against `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ColumnError::InvalidColumnConfiguration`] for incompatible
    /// roles or options that do not apply to the column type.
    pub fn to_column(&self, base_dir: &Path) -> std::result::Result<Column, ColumnError> {
        let invalid = |reason: &str| ColumnError::InvalidColumnConfiguration {
            key: self.key.clone(),
            reason: reason.to_string(),
        };
        if self.kind != ColumnType::Grade && self.max.is_some() {
            return Err(invalid("max only applies to grade columns"));
        }
        let has_file_options = self.base_path.is_some()
            || self.filename_template.is_some()
            || self.content_type.is_some();
        if self.kind != ColumnType::File && has_file_options {
            return Err(invalid("file options only apply to file columns"));
        }

        let kind = match self.kind {
            ColumnType::Text => ColumnKind::Text,
            ColumnType::Name => ColumnKind::Name,
            ColumnType::Grade => ColumnKind::Grade(GradeSpec {
                max: self.max,
                min: self.min,
                check_max: self.check_max,
            }),
            ColumnType::File => {
                let base_path = self
                    .base_path
                    .as_deref()
                    .map_or_else(|| base_dir.to_path_buf(), |path| resolve(base_dir, path));
                let mut spec = FileSpec::new().with_base_path(base_path);
                if let Some(template) = &self.filename_template {
                    spec = spec.with_filename_template(template)?;
                }
                if let Some(content_type) = &self.content_type {
                    spec = spec.with_content_type(content_type)?;
                }
                ColumnKind::File(spec)
            }
        };

        Column::from_roles(
            &self.key,
            kind,
            Roles {
                email: self.email,
                file: false,
                full_name: self.full_name,
            },
        )
    }
}

/// A mail merge job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Relay.
    pub smtp: SmtpConfig,
    /// Message subject.
    pub subject: String,
    /// Sender, `Name <email>` or `email`.
    pub from: String,
    /// Cc addresses.
    #[serde(default)]
    pub cc: Vec<String>,
    /// Inline body template.
    #[serde(default)]
    pub template: Option<String>,
    /// Body template file.
    #[serde(default)]
    pub template_file: Option<PathBuf>,
    /// Recipient table.
    pub recipients: RecipientsConfig,
    /// Table columns, in order.
    pub columns: Vec<ColumnSpec>,
    /// Field whose truthy value excludes a recipient.
    #[serde(default)]
    pub exclude_column: Option<String>,
    /// Fail instead of warning when an attachment is missing.
    #[serde(default = "default_true")]
    pub error_on_missing_attachments: bool,
    /// Sent log file.
    #[serde(default)]
    pub sent_log: Option<PathBuf>,
    #[serde(skip)]
    base_dir: PathBuf,
}

impl JobConfig {
    /// Loads a job file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid job.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading job from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        let mut job = Self::from_json(&text)?;
        job.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(job)
    }

    /// Parses a job, resolving relative paths against the working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid job.
    pub fn from_json(text: &str) -> Result<Self> {
        let job: Self = serde_json::from_str(text)?;
        if job.template.is_some() == job.template_file.is_some() {
            return Err(Error::Config(
                "exactly one of template and template_file must be set".to_string(),
            ));
        }
        Ok(job)
    }

    /// Builds the table columns.
    ///
    /// # Errors
    ///
    /// Returns the first invalid column.
    pub fn columns(&self) -> Result<Vec<Column>> {
        Ok(self
            .columns
            .iter()
            .map(|spec| spec.to_column(&self.base_dir))
            .collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// The body template text.
    ///
    /// # Errors
    ///
    /// Returns an error if the template file cannot be read.
    pub fn template_text(&self) -> Result<String> {
        match (&self.template, &self.template_file) {
            (Some(text), _) => Ok(text.clone()),
            (None, Some(path)) => Ok(std::fs::read_to_string(resolve(&self.base_dir, path))?),
            (None, None) => Err(Error::Config("no template configured".to_string())),
        }
    }

    /// The sender.
    ///
    /// # Errors
    ///
    /// Returns an error if `from` is not a valid address.
    pub fn from_address(&self) -> Result<Address> {
        Ok(self.from.parse::<Address>()?)
    }

    /// The Cc addresses.
    ///
    /// # Errors
    ///
    /// Returns the first invalid address.
    pub fn cc_addresses(&self) -> Result<Vec<Address>> {
        Ok(self
            .cc
            .iter()
            .map(|cc| cc.parse::<Address>())
            .collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Sent log path; the default name lives in the working directory.
    #[must_use]
    pub fn sent_log_path(&self) -> PathBuf {
        self.sent_log
            .as_deref()
            .map_or_else(|| PathBuf::from(LOG_FILENAME), |path| resolve(&self.base_dir, path))
    }

    /// Reads and binds the recipient table.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid columns or an unreadable table.
    pub fn load_recipients(&self) -> Result<Vec<Recipient>> {
        let delimiter = u8::try_from(self.recipients.delimiter).map_err(|_| {
            Error::Config(format!(
                "delimiter {:?} is not a single byte",
                self.recipients.delimiter
            ))
        })?;
        let options = TableOptions {
            delimiter,
            has_headers: self.recipients.has_headers,
            exclude_column: self.exclude_column.clone(),
        };
        load_recipients(
            &resolve(&self.base_dir, &self.recipients.path),
            &self.columns()?,
            &options,
        )
    }

    /// Builds the mailer for this job.
    ///
    /// # Errors
    ///
    /// Returns an error if any part of the job is invalid.
    pub fn build_mailer(&self, sent_log: SentLog, options: &ProcessOptions) -> Result<Mailer> {
        let template = Template::parse(&self.template_text()?)?;
        Ok(Mailer::new(
            &self.subject,
            template,
            self.load_recipients()?,
            self.from_address()?,
            sent_log,
        )
        .with_cc(self.cc_addresses()?)
        .with_error_on_missing_attachments(self.error_on_missing_attachments)
        .with_send_only_to(options.send_only_to.clone())
        .with_exclude(options.exclude.clone()))
    }
}

/// Operator switches for one invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessOptions {
    /// Hand messages to the relay instead of simulating.
    pub send_emails: bool,
    /// Address messages to the recipients instead of the sender.
    pub send_to_recipients: bool,
    /// Only print previews, without connecting.
    pub just_print: bool,
    /// Write each built message to stdout while sending.
    pub print_mails: bool,
    /// Stop after this many messages; 0 means no limit.
    pub max_num_emails: usize,
    /// Seconds to wait between messages.
    pub delay: Option<f64>,
    /// Only mail these emails.
    pub send_only_to: Vec<String>,
    /// Never mail these emails.
    pub exclude: Vec<String>,
}

/// What an invocation does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Print previews.
    Preview {
        /// Stop after this many previews; 0 means no limit.
        max_num_emails: usize,
    },
    /// Send or simulate through the relay.
    Deliver(SendOptions),
}

impl ProcessOptions {
    /// Picks the run mode. Unless told to mail the recipients, messages are
    /// redirected to `from`.
    ///
    /// # Errors
    ///
    /// Returns an error for a negative or non-finite delay.
    pub fn mode(&self, from: &Address) -> Result<RunMode> {
        if self.just_print {
            return Ok(RunMode::Preview {
                max_num_emails: self.max_num_emails,
            });
        }

        let delay = self
            .delay
            .map(|secs| {
                Duration::try_from_secs_f64(secs)
                    .map_err(|_| Error::Config(format!("invalid delay {secs}")))
            })
            .transpose()?;

        Ok(RunMode::Deliver(SendOptions {
            simulate: !self.send_emails,
            print_mails: self.print_mails,
            alt_to: (!self.send_to_recipients).then(|| from.clone()),
            max_num_emails: self.max_num_emails,
            delay,
        }))
    }
}

fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

const fn default_true() -> bool {
    true
}

const fn default_delimiter() -> char {
    ','
}

const fn default_min() -> Option<Decimal> {
    Some(Decimal::ZERO)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::value::Grade;
    use tempfile::TempDir;

    const JOB: &str = r#"{
        "smtp": { "host": "smtp.example.com", "security": "starttls", "username": "prof" },
        "subject": "Notas",
        "from": "Prof <prof@example.com>",
        "cc": ["tutor@example.com"],
        "template": "Hola {name_uncapitalized}: {exam}/{exam_max}",
        "recipients": { "path": "students.csv" },
        "columns": [
            { "key": "email", "email": true },
            { "key": "name", "type": "name", "full_name": true },
            { "key": "exam", "type": "grade", "max": 10 },
            { "key": "bonus", "type": "grade", "min": null, "check_max": false },
            { "key": "report", "type": "file", "base_path": "reports",
              "filename_template": "{}.pdf", "content_type": "application/pdf" }
        ]
    }"#;

    #[test]
    fn test_parse_job() {
        let job = JobConfig::from_json(JOB).unwrap();
        assert_eq!(job.smtp.security, SecurityMode::StartTls);
        assert_eq!(job.smtp.settings().port(), 587);
        assert_eq!(job.recipients.delimiter, ',');
        assert!(job.recipients.has_headers);
        assert!(job.error_on_missing_attachments);
        assert_eq!(job.sent_log_path(), PathBuf::from(LOG_FILENAME));

        let columns = job.columns().unwrap();
        assert!(columns[0].is_email());
        assert!(columns[1].is_full_name());
        assert!(columns[4].is_file());
        match columns[3].kind() {
            ColumnKind::Grade(spec) => {
                assert_eq!(spec.min, None);
                assert!(!spec.check_max);
            }
            other => panic!("unexpected kind {other:?}"),
        }
        match columns[2].kind() {
            ColumnKind::Grade(spec) => assert_eq!(spec.min, Some(Decimal::ZERO)),
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_incompatible_roles() {
        let spec: ColumnSpec =
            serde_json::from_str(r#"{ "key": "x", "type": "file", "email": true }"#).unwrap();
        assert!(matches!(
            spec.to_column(Path::new("")),
            Err(ColumnError::InvalidColumnConfiguration { .. })
        ));

        let spec: ColumnSpec =
            serde_json::from_str(r#"{ "key": "x", "email": true, "full_name": true }"#).unwrap();
        assert!(spec.to_column(Path::new("")).is_err());

        let spec: ColumnSpec = serde_json::from_str(r#"{ "key": "x", "max": 10 }"#).unwrap();
        assert!(spec.to_column(Path::new("")).is_err());
    }

    #[test]
    fn test_template_required_once() {
        let job = JOB.replace(r#""template":"#, r#""template_file": "body.txt", "template":"#);
        assert!(matches!(JobConfig::from_json(&job), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("reports")).unwrap();
        std::fs::write(
            dir.path().join("students.csv"),
            "email,name,exam,bonus,report\nana@example.com,ANA,\"7,5\",12,ana\n",
        )
        .unwrap();
        let job_path = dir.path().join("job.json");
        std::fs::write(&job_path, JOB).unwrap();

        let job = JobConfig::load(&job_path).unwrap();
        let recipients = job.load_recipients().unwrap();
        assert_eq!(recipients.len(), 1);
        let recipient = &recipients[0];
        assert_eq!(
            recipient.field("exam").and_then(|v| v.as_grade()),
            Some(Grade::Value(Decimal::new(75, 1)))
        );
        let (_, file) = recipient.attachments()[0];
        assert_eq!(file.path(), dir.path().join("reports").join("ana.pdf"));

        let mailer = job
            .build_mailer(
                SentLog::open(dir.path().join("log.csv")).unwrap(),
                &ProcessOptions::default(),
            )
            .unwrap();
        assert_eq!(mailer.recipients().len(), 1);
        assert_eq!(mailer.sender().full_name(), Some("Prof"));
    }

    #[test]
    fn test_mode_selection() {
        let from = Address::new("prof@example.com");

        let options = ProcessOptions {
            just_print: true,
            max_num_emails: 3,
            ..ProcessOptions::default()
        };
        assert_eq!(
            options.mode(&from).unwrap(),
            RunMode::Preview { max_num_emails: 3 }
        );

        let RunMode::Deliver(send) = ProcessOptions::default().mode(&from).unwrap() else {
            panic!("expected delivery");
        };
        assert!(send.simulate);
        assert_eq!(send.alt_to, Some(from.clone()));
        assert_eq!(send.delay, None);

        let options = ProcessOptions {
            send_emails: true,
            send_to_recipients: true,
            delay: Some(1.5),
            ..ProcessOptions::default()
        };
        let RunMode::Deliver(send) = options.mode(&from).unwrap() else {
            panic!("expected delivery");
        };
        assert!(!send.simulate);
        assert_eq!(send.alt_to, None);
        assert_eq!(send.delay, Some(Duration::from_millis(1500)));

        let options = ProcessOptions {
            delay: Some(-1.0),
            ..ProcessOptions::default()
        };
        assert!(matches!(options.mode(&from), Err(Error::Config(_))));
    }
}
