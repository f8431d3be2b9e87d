use std::fmt::Debug;
use std::path::{Path, PathBuf};

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{FileTransport, Message, SmtpTransport, Transport};

/// A fully addressed HTML message ready for a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMail {
    pub from: Mailbox,
    pub to: Mailbox,
    pub subject: String,
    pub html_body: String,
}

impl OutgoingMail {
    pub fn to_message(&self) -> Result<Message, MailError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(self.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(self.html_body.clone())?;
        Ok(message)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("unable to build message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("smtp delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("unable to write message to outbox: {0}")]
    Outbox(#[from] lettre::transport::file::Error),
    #[error("unable to prepare outbox {path}: {source}")]
    OutboxDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Outbound mail hook. Sends exactly once; callers decide what a failure means.
pub trait MailTransport: Debug {
    fn send(&self, mail: &OutgoingMail) -> Result<(), MailError>;
}

/// SMTP submission with STARTTLS and account login.
pub struct SmtpMailer {
    transport: SmtpTransport,
    host: String,
    port: u16,
}

impl SmtpMailer {
    pub fn starttls(
        host: &str,
        port: u16,
        username: &str,
        password: &str,
    ) -> Result<Self, MailError> {
        let credentials = Credentials::new(username.to_string(), password.to_string());
        let transport = SmtpTransport::starttls_relay(host)?
            .port(port)
            .credentials(credentials)
            .build();

        Ok(Self {
            transport,
            host: host.to_string(),
            port,
        })
    }
}

impl Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

impl MailTransport for SmtpMailer {
    fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let message = mail.to_message()?;
        self.transport.send(&message)?;
        Ok(())
    }
}

/// Drops each message as an `.eml` file in a local directory instead of sending it.
pub struct OutboxMailer {
    transport: FileTransport,
    dir: PathBuf,
}

impl OutboxMailer {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, MailError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| MailError::OutboxDir {
            path: dir.clone(),
            source,
        })?;

        Ok(Self {
            transport: FileTransport::new(&dir),
            dir,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Debug for OutboxMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboxMailer")
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}

impl MailTransport for OutboxMailer {
    fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let message = mail.to_message()?;
        self.transport.send(&message)?;
        Ok(())
    }
}
