mod report;
mod transport;

pub use transport::{MailError, MailTransport, OutboxMailer, OutgoingMail, SmtpMailer};

use std::path::{Path, PathBuf};

use lettre::message::Mailbox;
use lettre::Address;
use tracing::info;

use super::classifier::{ClassifiedApplicant, InvalidApplicant};
use super::domain::RowNumber;
use crate::config::ContactColumns;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("unable to read email template {path}: {source}")]
    Template {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid sender address '{address}': {source}")]
    InvalidSender {
        address: String,
        source: lettre::address::AddressError,
    },
    #[error("row {row} has no email address")]
    MissingRecipient { row: RowNumber },
    #[error("row {row} has an invalid email address '{address}': {source}")]
    InvalidRecipient {
        row: RowNumber,
        address: String,
        source: lettre::address::AddressError,
    },
    #[error("invalid error report recipient '{address}': {source}")]
    InvalidReportRecipient {
        address: String,
        source: lettre::address::AddressError,
    },
    #[error("sending to row {row} failed: {source}")]
    Delivery { row: RowNumber, source: MailError },
    #[error("sending error report failed: {0}")]
    Report(#[source] MailError),
}

/// Acceptance notice that was handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotice {
    pub row: RowNumber,
    pub recipient: String,
}

pub fn load_template(path: &Path) -> Result<String, NotifyError> {
    std::fs::read_to_string(path).map_err(|source| NotifyError::Template {
        path: path.to_path_buf(),
        source,
    })
}

/// Sends the acceptance template to qualified applicants through one transport.
#[derive(Debug)]
pub struct Notifier {
    transport: Box<dyn MailTransport>,
    sender: Mailbox,
    subject: String,
    template: String,
    columns: ContactColumns,
}

impl Notifier {
    pub fn new(
        transport: Box<dyn MailTransport>,
        sender: &str,
        subject: impl Into<String>,
        template: impl Into<String>,
        columns: ContactColumns,
    ) -> Result<Self, NotifyError> {
        let sender = sender
            .parse::<Mailbox>()
            .map_err(|source| NotifyError::InvalidSender {
                address: sender.to_string(),
                source,
            })?;

        Ok(Self {
            transport,
            sender,
            subject: subject.into(),
            template: template.into(),
            columns,
        })
    }

    /// Emails every qualified applicant in row order.
    ///
    /// Every address is checked before the first send; the first transport
    /// failure stops the batch.
    pub fn notify_qualified(
        &self,
        qualified: &[ClassifiedApplicant],
    ) -> Result<Vec<SentNotice>, NotifyError> {
        let outgoing = qualified
            .iter()
            .map(|applicant| self.acceptance_for(applicant))
            .collect::<Result<Vec<_>, _>>()?;

        let mut sent = Vec::with_capacity(outgoing.len());
        for (applicant, mail) in qualified.iter().zip(outgoing) {
            self.transport
                .send(&mail)
                .map_err(|source| NotifyError::Delivery {
                    row: applicant.row,
                    source,
                })?;

            let name = applicant.record.trimmed(&self.columns.name);
            info!(row = %applicant.row, name, recipient = %mail.to.email, "acceptance email sent");
            sent.push(SentNotice {
                row: applicant.row,
                recipient: mail.to.email.to_string(),
            });
        }

        Ok(sent)
    }

    /// Mails the administrator a table of unreadable records. No-op when there are none.
    pub fn send_error_report(
        &self,
        recipient: &str,
        invalid: &[InvalidApplicant],
    ) -> Result<bool, NotifyError> {
        if invalid.is_empty() {
            return Ok(false);
        }

        let to = recipient
            .parse::<Mailbox>()
            .map_err(|source| NotifyError::InvalidReportRecipient {
                address: recipient.to_string(),
                source,
            })?;

        let mail = OutgoingMail {
            from: self.sender.clone(),
            to,
            subject: report::error_report_subject(invalid.len()),
            html_body: report::render_error_report(invalid, &self.columns),
        };
        self.transport.send(&mail).map_err(NotifyError::Report)?;

        info!(invalid = invalid.len(), recipient, "error report sent");
        Ok(true)
    }

    fn acceptance_for(&self, applicant: &ClassifiedApplicant) -> Result<OutgoingMail, NotifyError> {
        let raw = applicant.record.trimmed(&self.columns.email);
        if raw.is_empty() {
            return Err(NotifyError::MissingRecipient { row: applicant.row });
        }

        let address = raw
            .parse::<Address>()
            .map_err(|source| NotifyError::InvalidRecipient {
                row: applicant.row,
                address: raw.to_string(),
                source,
            })?;
        let name = applicant.record.trimmed(&self.columns.name);
        let display_name = (!name.is_empty()).then(|| name.to_string());

        Ok(OutgoingMail {
            from: self.sender.clone(),
            to: Mailbox::new(display_name, address),
            subject: self.subject.clone(),
            html_body: self.template.clone(),
        })
    }
}
