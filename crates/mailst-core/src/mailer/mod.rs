//! Run orchestration.
//!
//! A [`Mailer`] holds everything one run needs: the recipients bound from
//! the table, the body template, the sender and the sent log. [`Mailer::send`]
//! delivers or simulates one message per eligible recipient and
//! [`Mailer::test`] writes a preview of each instead.

mod filter;
mod preview;
mod render;

pub use filter::{Selection, eligible, report_skipped};
pub use preview::Preview;
pub use render::{MissingAttachment, RenderedMessage};

use crate::address::Address;
use crate::error::Result;
use crate::recipient::Recipient;
use crate::sent_log::SentLog;
use crate::template::Template;
use crate::transport::Transport;
use chrono::Local;
use std::io::Write;
use std::time::Duration;
use tracing::{debug, info};

/// Delivery settings for [`Mailer::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOptions {
    /// Build messages without handing them to the transport.
    pub simulate: bool,
    /// Write every built message to the output stream.
    pub print_mails: bool,
    /// Redirect every message to this address.
    pub alt_to: Option<Address>,
    /// Stop after this many messages; 0 means no limit.
    pub max_num_emails: usize,
    /// Pause between consecutive messages.
    pub delay: Option<Duration>,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            simulate: true,
            print_mails: false,
            alt_to: None,
            max_num_emails: 0,
            delay: None,
        }
    }
}

/// One message handled by a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// The recipient the message was built for.
    pub recipient: Address,
    /// The address the message was addressed to.
    pub to: Address,
    /// Whether the transport was skipped.
    pub simulated: bool,
}

/// What a run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Recipients flagged as manually excluded.
    pub excluded: Vec<Address>,
    /// Recipients with an outstanding send in the log.
    pub already_sent: Vec<Address>,
    /// Messages sent, simulated or previewed, in order.
    pub processed: Vec<Delivery>,
    /// Attachments left out of processed messages.
    pub missing_attachments: Vec<MissingAttachment>,
}

/// Mail merge run over a recipient list.
#[derive(Debug)]
pub struct Mailer {
    subject: String,
    template: Template,
    recipients: Vec<Recipient>,
    from: Address,
    cc: Vec<Address>,
    error_on_missing_attachments: bool,
    send_only_to: Vec<String>,
    exclude: Vec<String>,
    sent_log: SentLog,
}

impl Mailer {
    /// Creates a mailer. Missing attachments are fatal by default.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        template: Template,
        recipients: Vec<Recipient>,
        from: Address,
        sent_log: SentLog,
    ) -> Self {
        Self {
            subject: subject.into(),
            template,
            recipients,
            from,
            cc: Vec::new(),
            error_on_missing_attachments: true,
            send_only_to: Vec::new(),
            exclude: Vec::new(),
            sent_log,
        }
    }

    /// Sets the Cc addresses added to every message not redirected.
    #[must_use]
    pub fn with_cc(mut self, cc: Vec<Address>) -> Self {
        self.cc = cc;
        self
    }

    /// Chooses between failing and warning on missing attachments.
    #[must_use]
    pub const fn with_error_on_missing_attachments(mut self, fatal: bool) -> Self {
        self.error_on_missing_attachments = fatal;
        self
    }

    /// Restricts the run to these emails.
    #[must_use]
    pub fn with_send_only_to(mut self, emails: Vec<String>) -> Self {
        self.send_only_to = emails;
        self
    }

    /// Never mails these emails.
    #[must_use]
    pub fn with_exclude(mut self, emails: Vec<String>) -> Self {
        self.exclude = emails;
        self
    }

    /// All recipients, in table order.
    #[must_use]
    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    /// The sender address.
    #[must_use]
    pub const fn sender(&self) -> &Address {
        &self.from
    }

    /// The sent log.
    #[must_use]
    pub const fn sent_log(&self) -> &SentLog {
        &self.sent_log
    }

    /// Recipients eligible for this run, in table order.
    #[must_use]
    pub fn filter(&self) -> Vec<&Recipient> {
        self.eligible()
            .into_iter()
            .map(|index| &self.recipients[index])
            .collect()
    }

    fn eligible(&self) -> Vec<usize> {
        eligible(
            &self.recipients,
            &self.sent_log,
            Selection {
                send_only_to: &self.send_only_to,
                exclude: &self.exclude,
            },
        )
    }

    fn start_report(&self) -> RunReport {
        let (excluded, already_sent) = report_skipped(&self.recipients, &self.sent_log);
        RunReport {
            excluded,
            already_sent,
            ..RunReport::default()
        }
    }

    /// Delivers, or simulates, one message per eligible recipient.
    ///
    /// Real deliveries to the recipient's own address are recorded in the
    /// sent log as soon as the transport accepts them.
    ///
    /// # Errors
    ///
    /// Stops at the first rendering, transport or log error.
    pub async fn send<T: Transport>(
        &mut self,
        transport: &mut T,
        options: &SendOptions,
        out: &mut impl Write,
    ) -> Result<RunReport> {
        let mut report = self.start_report();
        let alt_to = options.alt_to.as_ref();

        for index in self.eligible() {
            if !report.processed.is_empty()
                && let Some(delay) = options.delay
            {
                debug!("Waiting {delay:?} before the next message");
                tokio::time::sleep(delay).await;
            }

            let recipient = &self.recipients[index];
            let rendered = self.render(recipient, alt_to)?;
            if options.print_mails {
                write!(out, "{}", rendered.message)?;
                writeln!(out)?;
            }

            if options.simulate {
                match alt_to {
                    None => info!("Email simulated (not sent) to: {recipient}"),
                    Some(alt) => {
                        info!("Email simulated (not sent) to: {alt} instead of {recipient}");
                    }
                }
            } else {
                transport
                    .send(&rendered.envelope, &rendered.message.to_bytes())
                    .await?;
                match alt_to {
                    None => {
                        info!("Email sent to: {recipient}");
                        let email = recipient.address().require_email()?;
                        self.sent_log
                            .record_send(email, Local::now().naive_local())?;
                    }
                    Some(alt) => info!("Email sent to: {alt} instead of {recipient}"),
                }
            }

            report.processed.push(Delivery {
                recipient: recipient.address().clone(),
                to: alt_to.unwrap_or_else(|| recipient.address()).clone(),
                simulated: options.simulate,
            });
            report.missing_attachments.extend(rendered.missing);

            if options.max_num_emails != 0 && report.processed.len() >= options.max_num_emails {
                break;
            }
        }

        Ok(report)
    }

    /// Writes a preview of each eligible recipient's message to `out`.
    ///
    /// # Errors
    ///
    /// Stops at the first rendering or write error.
    pub fn test(&self, max_num_emails: usize, out: &mut impl Write) -> Result<RunReport> {
        let mut report = self.start_report();

        for index in self.eligible() {
            let recipient = &self.recipients[index];
            let preview = self.preview(recipient)?;
            writeln!(out, "{}", preview.text)?;
            writeln!(out)?;

            report.processed.push(Delivery {
                recipient: recipient.address().clone(),
                to: recipient.address().clone(),
                simulated: true,
            });
            report.missing_attachments.extend(preview.missing);

            if max_num_emails != 0 && report.processed.len() >= max_num_emails {
                break;
            }
        }

        Ok(report)
    }

    /// Lets `email` be mailed again by appending a `forget` event.
    ///
    /// Returns whether a delivery to `email` was recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be appended to.
    pub fn forget(&mut self, email: &str) -> Result<bool> {
        Ok(self.sent_log.forget(email, Local::now().naive_local())?)
    }
}
