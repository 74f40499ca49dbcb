//! Type-state SMTP client.

use crate::capability::Capabilities;
use crate::command::Command;
use crate::envelope::Envelope;
use crate::error::{Error, Result};
use crate::reply::{Reply, ReplyCode, is_last_line};
use crate::stream::{Security, SmtpStream};
use base64::Engine;
use std::marker::PhantomData;
use tracing::{debug, warn};

/// Type-state marker: greeting received, EHLO not yet sent.
#[derive(Debug)]
pub struct Connected;

/// Type-state marker: EHLO accepted, capabilities known.
#[derive(Debug)]
pub struct Greeted;

/// Type-state marker: ready for mail transactions.
#[derive(Debug)]
pub struct Ready;

/// SMTP client with type-state pattern.
#[derive(Debug)]
pub struct Client<State> {
    stream: SmtpStream,
    hello_name: String,
    capabilities: Capabilities,
    _state: PhantomData<State>,
}

impl Client<Connected> {
    /// Connects to a relay and reads its greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails or the greeting is not 220.
    pub async fn connect(hostname: &str, port: u16, security: Security) -> Result<Self> {
        debug!("Connecting to {hostname}:{port} ({security:?})");
        let stream = SmtpStream::connect(hostname, port, security).await?;
        Self::from_stream(stream).await
    }

    /// Creates a client from a stream and reads the server greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the greeting fails or it is not 220.
    pub async fn from_stream(mut stream: SmtpStream) -> Result<Self> {
        let greeting = read_reply(&mut stream)
            .await?
            .expect(Some(ReplyCode::SERVICE_READY))?;
        debug!("Server greeting: {}", greeting.text());

        Ok(Self {
            stream,
            hello_name: String::new(),
            capabilities: Capabilities::default(),
            _state: PhantomData,
        })
    }

    /// Sends EHLO and records the server capabilities.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects EHLO.
    pub async fn ehlo(mut self, hello_name: &str) -> Result<Client<Greeted>> {
        self.hello_name = hello_name.to_string();
        self.capabilities = self.greet().await?;
        Ok(self.transition())
    }
}

impl Client<Greeted> {
    /// Upgrades the connection with STARTTLS and repeats EHLO.
    ///
    /// # Errors
    ///
    /// Returns an error if STARTTLS is not offered or the upgrade fails.
    pub async fn starttls(mut self, server_hostname: &str) -> Result<Self> {
        if !self.capabilities.starttls {
            return Err(Error::NotSupported("STARTTLS".into()));
        }

        self.command(Command::StartTls)
            .await?
            .expect(Some(ReplyCode::SERVICE_READY))?;
        self.stream = self.stream.upgrade_to_tls(server_hostname).await?;
        self.capabilities = self.greet().await?;

        Ok(self)
    }

    /// Authenticates with AUTH PLAIN.
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not offer PLAIN or rejects the
    /// credentials.
    pub async fn auth_plain(mut self, username: &str, password: &str) -> Result<Client<Ready>> {
        if !self.capabilities.supports_auth("PLAIN") {
            return Err(Error::NotSupported("AUTH PLAIN".into()));
        }

        let credentials = format!("\0{username}\0{password}");
        let initial_response =
            base64::engine::general_purpose::STANDARD.encode(credentials.as_bytes());

        self.command(Command::AuthPlain { initial_response })
            .await?
            .expect(Some(ReplyCode::AUTH_OK))?;
        debug!("Authenticated as {username}");

        Ok(self.transition())
    }

    /// Proceeds without authentication.
    #[must_use]
    pub fn ready(self) -> Client<Ready> {
        self.transition()
    }
}

impl Client<Ready> {
    /// Submits one message to every recipient of `envelope`.
    ///
    /// Line endings are normalized to CRLF and lines starting with `.` are
    /// stuffed. A rejected transaction is reset so the session stays usable.
    ///
    /// # Errors
    ///
    /// Returns an error if any step of the transaction is rejected.
    pub async fn send(&mut self, envelope: &Envelope, message: &[u8]) -> Result<()> {
        match self.transaction(envelope, message).await {
            Ok(()) => Ok(()),
            Err(err @ Error::Rejected { .. }) => {
                if let Err(reset_err) = self.command(Command::Rset).await {
                    warn!("RSET after rejected transaction failed: {reset_err}");
                }
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    async fn transaction(&mut self, envelope: &Envelope, message: &[u8]) -> Result<()> {
        let eight_bit = self.capabilities.eight_bit_mime && !message.is_ascii();
        let size = self.capabilities.max_size.map(|_| message.len());

        self.command(Command::MailFrom {
            from: envelope.from.clone(),
            eight_bit,
            size,
        })
        .await?
        .expect(None)?;

        for to in &envelope.to {
            self.command(Command::RcptTo { to: to.clone() })
                .await?
                .expect(None)?;
        }

        self.command(Command::Data)
            .await?
            .expect(Some(ReplyCode::START_DATA))?;

        self.stream.write_all(&data_payload(message)).await?;
        read_reply(&mut self.stream).await?.expect(None)?;

        debug!(
            "Message accepted for {} recipient(s) from {}",
            envelope.to.len(),
            envelope.from
        );
        Ok(())
    }
}

impl<S> Client<S> {
    /// Returns the capabilities from the last EHLO.
    #[must_use]
    pub const fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Sends QUIT and closes the connection (available in any state).
    ///
    /// # Errors
    ///
    /// Returns an error if the QUIT command fails.
    pub async fn quit(mut self) -> Result<()> {
        let reply = self.command(Command::Quit).await?;
        if !reply.is_success() && reply.code != ReplyCode::CLOSING {
            return Err(Error::rejected(reply.code.as_u16(), reply.text()));
        }
        Ok(())
    }

    async fn greet(&mut self) -> Result<Capabilities> {
        let reply = self
            .command(Command::Ehlo {
                hostname: self.hello_name.clone(),
            })
            .await?
            .expect(None)?;
        Ok(Capabilities::from_ehlo(&reply))
    }

    async fn command(&mut self, cmd: Command) -> Result<Reply> {
        debug!("SMTP > {}", cmd.verb());
        self.stream.write_all(&cmd.serialize()).await?;
        let reply = read_reply(&mut self.stream).await?;
        debug!("SMTP < {}", reply.code);
        Ok(reply)
    }

    fn transition<T>(self) -> Client<T> {
        Client {
            stream: self.stream,
            hello_name: self.hello_name,
            capabilities: self.capabilities,
            _state: PhantomData,
        }
    }
}

async fn read_reply(stream: &mut SmtpStream) -> Result<Reply> {
    let mut lines = Vec::new();
    loop {
        let line = stream.read_line().await?;
        if line.is_empty() {
            continue;
        }

        let is_last = is_last_line(&line);
        lines.push(line);

        if is_last {
            break;
        }
    }

    Reply::parse(&lines)
}

/// Builds the DATA payload: CRLF line endings, dot-stuffing and the
/// terminating `.` line.
fn data_payload(message: &[u8]) -> Vec<u8> {
    let body = message.strip_suffix(b"\n").unwrap_or(message);
    let mut out = Vec::with_capacity(message.len() + message.len() / 32 + 5);

    for line in body.split(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.first() == Some(&b'.') {
            out.push(b'.');
        }
        out.extend_from_slice(line);
        out.extend_from_slice(b"\r\n");
    }

    out.extend_from_slice(b".\r\n");
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    const EHLO_REPLY: &[u8] = b"250-mx.example.com\r\n250-AUTH PLAIN LOGIN\r\n250 8BITMIME\r\n";

    #[test]
    fn test_data_payload_normalizes_and_stuffs() {
        assert_eq!(
            data_payload(b"Subject: Hi\r\n\r\n.hidden\nline\r\n"),
            b"Subject: Hi\r\n\r\n..hidden\r\nline\r\n.\r\n"
        );
        assert_eq!(data_payload(b"no newline"), b"no newline\r\n.\r\n");
        assert_eq!(data_payload(b"."), b"..\r\n.\r\n");
    }

    #[tokio::test]
    async fn test_full_session() {
        let mock = Builder::new()
            .read(b"220 mx.example.com ESMTP\r\n")
            .write(b"EHLO client.example.com\r\n")
            .read(EHLO_REPLY)
            .write(b"AUTH PLAIN AHVzZXIAcGFzcw==\r\n")
            .read(b"235 2.7.0 Authentication successful\r\n")
            .write(b"MAIL FROM:<teacher@example.com>\r\n")
            .read(b"250 OK\r\n")
            .write(b"RCPT TO:<student@example.com>\r\n")
            .read(b"250 OK\r\n")
            .write(b"DATA\r\n")
            .read(b"354 End data with <CR><LF>.<CR><LF>\r\n")
            .write(b"Subject: Hi\r\n\r\nHello\r\n.\r\n")
            .read(b"250 Queued\r\n")
            .write(b"QUIT\r\n")
            .read(b"221 Bye\r\n")
            .build();

        let client = Client::from_stream(SmtpStream::from_io(mock)).await.unwrap();
        let greeted = client.ehlo("client.example.com").await.unwrap();
        assert!(greeted.capabilities().supports_auth("PLAIN"));
        let mut session = greeted.auth_plain("user", "pass").await.unwrap();

        let envelope = Envelope::new("teacher@example.com", ["student@example.com"]).unwrap();
        session
            .send(&envelope, b"Subject: Hi\r\n\r\nHello\r\n")
            .await
            .unwrap();
        session.quit().await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_recipient_resets_transaction() {
        let mock = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"EHLO client\r\n")
            .read(b"250 mx\r\n")
            .write(b"MAIL FROM:<a@example.com>\r\n")
            .read(b"250 OK\r\n")
            .write(b"RCPT TO:<nobody@example.com>\r\n")
            .read(b"550 No such user\r\n")
            .write(b"RSET\r\n")
            .read(b"250 Reset\r\n")
            .write(b"QUIT\r\n")
            .read(b"221 Bye\r\n")
            .build();

        let client = Client::from_stream(SmtpStream::from_io(mock)).await.unwrap();
        let mut session = client.ehlo("client").await.unwrap().ready();

        let envelope = Envelope::new("a@example.com", ["nobody@example.com"]).unwrap();
        let err = session.send(&envelope, b"body").await.unwrap_err();
        assert!(matches!(err, Error::Rejected { code: 550, .. }));

        session.quit().await.unwrap();
    }

    #[tokio::test]
    async fn test_bad_greeting() {
        let mock = Builder::new().read(b"554 go away\r\n").build();
        let err = Client::from_stream(SmtpStream::from_io(mock))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Rejected { code: 554, .. }));
    }

    #[tokio::test]
    async fn test_starttls_requires_capability() {
        let mock = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"EHLO client\r\n")
            .read(b"250 mx\r\n")
            .build();

        let client = Client::from_stream(SmtpStream::from_io(mock)).await.unwrap();
        let greeted = client.ehlo("client").await.unwrap();
        assert!(matches!(
            greeted.starttls("mx.example.com").await,
            Err(Error::NotSupported(_))
        ));
    }

    #[tokio::test]
    async fn test_eight_bit_body_announced() {
        let mock = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"EHLO client\r\n")
            .read(b"250-mx\r\n250-8BITMIME\r\n250 SIZE 1000\r\n")
            .write(b"MAIL FROM:<a@example.com> BODY=8BITMIME SIZE=7\r\n")
            .read(b"250 OK\r\n")
            .write(b"RCPT TO:<b@example.com>\r\n")
            .read(b"250 OK\r\n")
            .write(b"DATA\r\n")
            .read(b"354 go\r\n")
            .write("ñandú\r\n.\r\n".as_bytes())
            .read(b"250 OK\r\n")
            .build();

        let client = Client::from_stream(SmtpStream::from_io(mock)).await.unwrap();
        let mut session = client.ehlo("client").await.unwrap().ready();
        let envelope = Envelope::new("a@example.com", ["b@example.com"]).unwrap();
        session.send(&envelope, "ñandú".as_bytes()).await.unwrap();
    }
}
