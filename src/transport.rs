// src/transport.rs
//! TLS byte stream to the API host.

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::ServerName;
use rustls::{CertificateError, ClientConfig, ClientConnection, RootCertStore, StreamOwned};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Size of the buffer handed to each underlying read.
pub const READ_BUFFER_SIZE: usize = 4096;

/// How many times a read is re-issued after a transient retry signal.
pub const READ_RETRY_LIMIT: u32 = 50;

const READ_RETRY_PAUSE: Duration = Duration::from_millis(20);

/// Ordered, bidirectional byte stream. The HTTP codec only needs these two
/// operations, which keeps it independent of TLS.
pub trait Transport {
    /// Write every byte and flush before returning.
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;

    /// Perform one underlying read. Never returns an empty chunk.
    fn read_chunk(&mut self) -> Result<Vec<u8>>;
}

/// A verified TLS connection over TCP.
pub struct TlsTransport {
    stream: StreamOwned<ClientConnection, TcpStream>,
}

impl TlsTransport {
    /// Connect, run the handshake with SNI for `host`, and verify the server
    /// certificate against the platform trust store and the host name.
    pub fn connect(host: &str, port: u16) -> Result<Self> {
        let config = client_config()?;
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| Error::HandshakeSetup(format!("invalid server name {host}: {e}")))?;
        let mut conn = ClientConnection::new(Arc::new(config), server_name)
            .map_err(|e| Error::HandshakeSetup(e.to_string()))?;

        let mut sock = TcpStream::connect((host, port)).map_err(|source| Error::Connect {
            host: host.to_string(),
            port,
            source,
        })?;

        while conn.is_handshaking() {
            conn.complete_io(&mut sock)
                .map_err(|e| handshake_error(e, host))?;
        }

        if conn.peer_certificates().is_none_or(|certs| certs.is_empty()) {
            return Err(Error::NoCertificate);
        }

        debug!(
            host,
            port,
            version = ?conn.protocol_version(),
            "TLS handshake complete"
        );

        Ok(Self {
            stream: StreamOwned::new(conn, sock),
        })
    }
}

impl Transport for TlsTransport {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.stream.write_all(bytes).map_err(Error::Write)?;
        self.stream.flush().map_err(Error::Write)
    }

    fn read_chunk(&mut self) -> Result<Vec<u8>> {
        let mut buf = [0u8; READ_BUFFER_SIZE];
        read_once(&mut self.stream, &mut buf, READ_RETRY_PAUSE)
    }
}

/// One read from `reader`, re-issued up to [`READ_RETRY_LIMIT`] times while it
/// signals `Interrupted` or `WouldBlock`. End of stream maps to `EmptyRead`.
fn read_once<R: Read>(reader: &mut R, buf: &mut [u8], pause: Duration) -> Result<Vec<u8>> {
    for _ in 0..READ_RETRY_LIMIT {
        match reader.read(buf) {
            Ok(0) => return Err(Error::EmptyRead),
            Ok(n) => return Ok(buf[..n].to_vec()),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                std::thread::sleep(pause);
                continue;
            }
            // Peer went away without close_notify.
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Err(Error::EmptyRead),
            Err(e) => return Err(Error::Read(e)),
        }
    }
    warn!(limit = READ_RETRY_LIMIT, "read kept signalling retry");
    Err(Error::Read(io::Error::new(
        io::ErrorKind::TimedOut,
        "read retry limit reached",
    )))
}

fn client_config() -> Result<ClientConfig> {
    let loaded = rustls_native_certs::load_native_certs();
    for err in &loaded.errors {
        debug!(error = %err, "skipping unreadable native certificate");
    }

    let mut roots = RootCertStore::empty();
    let (added, ignored) = roots.add_parsable_certificates(loaded.certs);
    if roots.is_empty() {
        return Err(Error::TrustStore(
            "no usable certificates in the platform trust store".to_string(),
        ));
    }
    debug!(added, ignored, "loaded native root certificates");

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::HandshakeSetup(e.to_string()))?
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(config)
}

/// Sort a handshake failure into the verification outcome it represents.
fn handshake_error(err: io::Error, host: &str) -> Error {
    let Some(tls) = err
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<rustls::Error>())
    else {
        return Error::Handshake(err.to_string());
    };

    match tls {
        rustls::Error::NoCertificatesPresented => Error::NoCertificate,
        rustls::Error::InvalidCertificate(cert) if is_name_mismatch(cert) => {
            Error::HostnameMismatch(host.to_string())
        }
        rustls::Error::InvalidCertificate(cert) => Error::Verification(cert.to_string()),
        other => Error::Handshake(other.to_string()),
    }
}

fn is_name_mismatch(err: &CertificateError) -> bool {
    matches!(
        err,
        CertificateError::NotValidForName | CertificateError::NotValidForNameContext { .. }
    )
}
