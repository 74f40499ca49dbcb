//! Byte stream under an SMTP session.

use crate::error::{Error, Result};
use rustls::pki_types::ServerName;
use std::fmt;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::{
    TlsConnector,
    rustls::{ClientConfig, RootCertStore},
};

/// Connection security for the relay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Security {
    /// Plain TCP, no encryption.
    #[default]
    None,
    /// Plain TCP upgraded with STARTTLS.
    StartTls,
    /// Implicit TLS from the first byte.
    Tls,
}

impl Security {
    /// Conventional submission port for this security mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::None => 25,
            Self::StartTls => 587,
            Self::Tls => 465,
        }
    }
}

/// Any duplex byte stream usable under an SMTP session.
pub trait Duplex: AsyncRead + AsyncWrite + Unpin {}

impl<T: AsyncRead + AsyncWrite + Unpin> Duplex for T {}

/// SMTP stream (TCP, TLS or a caller supplied stream).
pub enum SmtpStream {
    /// Plain TCP connection.
    Tcp(BufReader<TcpStream>),
    /// TLS-encrypted connection.
    Tls(Box<BufReader<tokio_rustls::client::TlsStream<TcpStream>>>),
    /// Caller supplied stream, e.g. an in-memory mock.
    Other(Box<BufReader<Box<dyn Duplex>>>),
}

impl fmt::Debug for SmtpStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Tcp(_) => "Tcp",
            Self::Tls(_) => "Tls",
            Self::Other(_) => "Other",
        };
        f.debug_tuple("SmtpStream").field(&kind).finish()
    }
}

impl SmtpStream {
    /// Opens a connection according to `security`.
    ///
    /// With [`Security::StartTls`] the connection starts in plain text and the
    /// session upgrades it after EHLO.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or TLS handshake fails.
    pub async fn connect(hostname: &str, port: u16, security: Security) -> Result<Self> {
        let tcp = TcpStream::connect((hostname, port)).await?;
        match security {
            Security::None | Security::StartTls => Ok(Self::Tcp(BufReader::new(tcp))),
            Security::Tls => {
                let tls = handshake(hostname, tcp).await?;
                Ok(Self::Tls(Box::new(BufReader::new(tls))))
            }
        }
    }

    /// Wraps an arbitrary duplex stream.
    #[must_use]
    pub fn from_io<T>(io: T) -> Self
    where
        T: AsyncRead + AsyncWrite + Unpin + 'static,
    {
        let io: Box<dyn Duplex> = Box::new(io);
        Self::Other(Box::new(BufReader::new(io)))
    }

    /// Reads one line, without the trailing CRLF.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the peer closed the connection.
    pub async fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let read = match self {
            Self::Tcp(reader) => reader.read_line(&mut line).await?,
            Self::Tls(reader) => reader.read_line(&mut line).await?,
            Self::Other(reader) => reader.read_line(&mut line).await?,
        };
        if read == 0 {
            return Err(Error::ConnectionClosed);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Writes and flushes data.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Self::Tcp(reader) => {
                reader.get_mut().write_all(data).await?;
                reader.get_mut().flush().await?;
            }
            Self::Tls(reader) => {
                reader.get_mut().write_all(data).await?;
                reader.get_mut().flush().await?;
            }
            Self::Other(reader) => {
                reader.get_mut().write_all(data).await?;
                reader.get_mut().flush().await?;
            }
        }
        Ok(())
    }

    /// Upgrades a plain TCP stream to TLS.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is not plain TCP or the handshake fails.
    pub async fn upgrade_to_tls(self, hostname: &str) -> Result<Self> {
        let tcp = match self {
            Self::Tcp(reader) => reader.into_inner(),
            Self::Tls(_) => return Err(Error::Protocol("Already using TLS".into())),
            Self::Other(_) => return Err(Error::NotSupported("TLS upgrade on this stream".into())),
        };
        let tls = handshake(hostname, tcp).await?;
        Ok(Self::Tls(Box::new(BufReader::new(tls))))
    }
}

async fn handshake(
    hostname: &str,
    tcp: TcpStream,
) -> Result<tokio_rustls::client::TlsStream<TcpStream>> {
    let server_name = ServerName::try_from(hostname.to_string())
        .map_err(|_| Error::Protocol(format!("Invalid hostname: {hostname}")))?;
    Ok(tls_connector().connect(server_name, tcp).await?)
}

/// TLS connector trusting the bundled web PKI roots.
fn tls_connector() -> TlsConnector {
    let root_store = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ports() {
        assert_eq!(Security::None.default_port(), 25);
        assert_eq!(Security::StartTls.default_port(), 587);
        assert_eq!(Security::Tls.default_port(), 465);
        assert_eq!(Security::default(), Security::None);
    }

    #[tokio::test]
    async fn test_read_line_strips_crlf() {
        let mock = tokio_test::io::Builder::new()
            .read(b"220 ready\r\n250 OK\r\n")
            .build();
        let mut stream = SmtpStream::from_io(mock);
        assert_eq!(stream.read_line().await.unwrap(), "220 ready");
        assert_eq!(stream.read_line().await.unwrap(), "250 OK");
    }

    #[tokio::test]
    async fn test_read_line_eof() {
        let mock = tokio_test::io::Builder::new().build();
        let mut stream = SmtpStream::from_io(mock);
        assert!(matches!(
            stream.read_line().await,
            Err(Error::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_upgrade_other_stream_is_unsupported() {
        let mock = tokio_test::io::Builder::new().build();
        let stream = SmtpStream::from_io(mock);
        assert!(matches!(
            stream.upgrade_to_tls("example.com").await,
            Err(Error::NotSupported(_))
        ));
    }
}
