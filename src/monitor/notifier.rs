//! Email notifications over SMTP.
//!
//! Each notification opens its own session: connect, STARTTLS, AUTH with the
//! configured credentials, send one plain-text UTF-8 message, quit. The sender
//! address is the SMTP login.

use lettre::address::AddressError;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::fmt;
use thiserror::Error;

/// Error type for notification delivery.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// A sender or recipient address could not be parsed.
    #[error("invalid email address {address:?}: {source}")]
    Address {
        address: String,
        #[source]
        source: AddressError,
    },

    /// The message could not be assembled.
    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    /// Connection, STARTTLS, authentication or delivery failed.
    #[error("SMTP delivery via {server} failed: {source}")]
    Transport {
        server: String,
        #[source]
        source: lettre::transport::smtp::Error,
    },
}

/// Channel for change notifications.
pub trait Notifier {
    /// Deliver one notification.
    fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// SMTP relay settings.
#[derive(Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    /// Relay host.
    pub server: String,
    /// Relay port; STARTTLS is negotiated after connecting.
    pub port: u16,
    /// Login name, also the sender address.
    pub user: String,
    pub password: String,
    /// The single recipient.
    pub receiver: String,
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("receiver", &self.receiver)
            .finish()
    }
}

/// Notifier that delivers through an SMTP relay.
#[derive(Debug, Clone)]
pub struct SmtpNotifier {
    settings: SmtpSettings,
}

impl SmtpNotifier {
    #[must_use]
    pub fn new(settings: SmtpSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn settings(&self) -> &SmtpSettings {
        &self.settings
    }

    /// Assemble the message without sending it.
    pub fn build_message(&self, subject: &str, body: &str) -> Result<Message, NotifyError> {
        let from = parse_mailbox(&self.settings.user)?;
        let to = parse_mailbox(&self.settings.receiver)?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;
        Ok(message)
    }

    fn transport(&self) -> Result<SmtpTransport, NotifyError> {
        let transport = SmtpTransport::starttls_relay(&self.settings.server)
            .map_err(|source| self.transport_err(source))?
            .port(self.settings.port)
            .credentials(Credentials::new(
                self.settings.user.clone(),
                self.settings.password.clone(),
            ))
            .build();
        Ok(transport)
    }

    fn transport_err(&self, source: lettre::transport::smtp::Error) -> NotifyError {
        NotifyError::Transport {
            server: format!("{}:{}", self.settings.server, self.settings.port),
            source,
        }
    }
}

impl Notifier for SmtpNotifier {
    fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        let message = self.build_message(subject, body)?;
        let transport = self.transport()?;

        log::debug!(
            "Sending notification to {} via {}:{}",
            self.settings.receiver,
            self.settings.server,
            self.settings.port
        );
        transport
            .send(&message)
            .map_err(|source| self.transport_err(source))?;
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address
        .trim()
        .parse()
        .map_err(|source| NotifyError::Address {
            address: address.to_string(),
            source,
        })
}
