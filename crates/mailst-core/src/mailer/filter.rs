//! Recipient selection for a run.

use crate::address::Address;
use crate::recipient::Recipient;
use crate::sent_log::SentLog;
use tracing::info;

/// Lists that narrow a run to a subset of the table.
#[derive(Debug, Clone, Copy)]
pub struct Selection<'a> {
    /// When non-empty, only these emails are eligible.
    pub send_only_to: &'a [String],
    /// Emails that are never eligible.
    pub exclude: &'a [String],
}

impl Selection<'_> {
    fn admits(&self, address: &Address) -> bool {
        let email = address.email().unwrap_or_default();
        (self.send_only_to.is_empty() || self.send_only_to.iter().any(|e| e == email))
            && !self.exclude.iter().any(|e| e == email)
    }
}

/// Indices of the recipients eligible for this run, in table order.
#[must_use]
pub fn eligible(
    recipients: &[Recipient],
    sent_log: &SentLog,
    selection: Selection<'_>,
) -> Vec<usize> {
    recipients
        .iter()
        .enumerate()
        .filter(|(_, r)| {
            !r.exclude() && !sent_log.contains(r.address()) && selection.admits(r.address())
        })
        .map(|(index, _)| index)
        .collect()
}

/// Logs and returns the manually excluded and the already mailed recipients.
pub fn report_skipped(
    recipients: &[Recipient],
    sent_log: &SentLog,
) -> (Vec<Address>, Vec<Address>) {
    let excluded: Vec<Address> = recipients
        .iter()
        .filter(|r| r.exclude())
        .map(|r| r.address().clone())
        .collect();
    for address in &excluded {
        info!("Excluded: {address}");
    }

    let already_sent: Vec<Address> = recipients
        .iter()
        .filter(|r| sent_log.contains(r.address()))
        .map(|r| r.address().clone())
        .collect();
    for address in &already_sent {
        info!("Already sent to: {address}");
    }

    (excluded, already_sent)
}
