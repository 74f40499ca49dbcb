//! Delivery of built messages to a relay.

use mailst_smtp::{Client, Connected, Ready};
use tracing::{debug, info};

pub use mailst_smtp::{Envelope, Security};

/// Errors raised by a transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// SMTP failure.
    #[error(transparent)]
    Smtp(#[from] mailst_smtp::Error),
}

/// Something that can deliver one message at a time.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Delivers `message` to every recipient of `envelope`.
    ///
    /// # Errors
    ///
    /// Returns an error if the message was not accepted.
    async fn send(&mut self, envelope: &Envelope, message: &[u8]) -> Result<(), TransportError>;
}

/// Relay connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    /// Relay host name.
    pub host: String,
    /// Port; the conventional one for `security` when unset.
    pub port: Option<u16>,
    /// Connection security.
    pub security: Security,
    /// User for AUTH PLAIN; no authentication when unset.
    pub username: Option<String>,
    /// Password for AUTH PLAIN.
    pub password: Option<String>,
    /// Name announced in EHLO.
    pub hello_name: String,
}

impl SmtpSettings {
    /// Plain, unauthenticated settings for `host`.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            security: Security::None,
            username: None,
            password: None,
            hello_name: "localhost".to_string(),
        }
    }

    /// Effective port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.security.default_port())
    }
}

/// SMTP session kept open for a whole run.
#[derive(Debug)]
pub struct SmtpTransport {
    client: Client<Ready>,
}

impl SmtpTransport {
    /// Connects, greets, upgrades and authenticates as configured.
    ///
    /// # Errors
    ///
    /// Returns an error if any step of the session setup fails.
    pub async fn connect(settings: &SmtpSettings) -> Result<Self, TransportError> {
        let port = settings.port();
        info!("Connecting to {}:{port}", settings.host);
        let client = Client::connect(&settings.host, port, settings.security).await?;
        Self::handshake(client, settings).await
    }

    /// Runs the session setup on a client that has read the greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if any step of the session setup fails.
    pub async fn handshake(
        client: Client<Connected>,
        settings: &SmtpSettings,
    ) -> Result<Self, TransportError> {
        let mut client = client.ehlo(&settings.hello_name).await?;
        if settings.security == Security::StartTls {
            client = client.starttls(&settings.host).await?;
        }

        let client = match &settings.username {
            Some(username) => {
                let password = settings.password.as_deref().unwrap_or_default();
                client.auth_plain(username, password).await?
            }
            None => client.ready(),
        };
        debug!("SMTP session ready");

        Ok(Self { client })
    }

    /// Ends the session with QUIT.
    ///
    /// # Errors
    ///
    /// Returns an error if QUIT is rejected.
    pub async fn close(self) -> Result<(), TransportError> {
        self.client.quit().await?;
        Ok(())
    }
}

impl Transport for SmtpTransport {
    async fn send(&mut self, envelope: &Envelope, message: &[u8]) -> Result<(), TransportError> {
        self.client.send(envelope, message).await?;
        Ok(())
    }
}
