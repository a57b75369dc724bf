// src/error.rs
//! Failure taxonomy shared by every layer of the bot.
//!
//! Each variant maps to a [`ErrorKind`], which decides whether the
//! supervisor restarts the session, and to a distinct process exit code.

use std::fmt;

/// HTTP status codes the classifier treats as fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    GatewayUnavailable,
    Unexpected(u16),
}

impl StatusKind {
    pub fn reason(&self) -> &'static str {
        match self {
            StatusKind::BadRequest => "bad request",
            StatusKind::Unauthorized => "unauthorized",
            StatusKind::Forbidden => "forbidden",
            StatusKind::NotFound => "not found",
            StatusKind::MethodNotAllowed => "method not allowed",
            StatusKind::GatewayUnavailable => "gateway unavailable",
            StatusKind::Unexpected(_) => "unexpected status",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            StatusKind::BadRequest => 220,
            StatusKind::Unauthorized => 221,
            StatusKind::Forbidden => 223,
            StatusKind::NotFound => 224,
            StatusKind::MethodNotAllowed => 225,
            StatusKind::GatewayUnavailable => 226,
            StatusKind::Unexpected(_) => 230,
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusKind::Unexpected(code) => write!(f, "{} ({code})", self.reason()),
            _ => f.write_str(self.reason()),
        }
    }
}

/// Coarse grouping of failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    TransportSetup,
    TlsVerification,
    TransportIo,
    ProtocolFraming,
    HttpStatus,
    FieldExtraction,
    LogicalPrecondition,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("couldn't set up a trust store: {0}")]
    TrustStore(String),
    #[error("TLS client setup failed: {0}")]
    HandshakeSetup(String),
    #[error("failed to connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },
    #[error("TLS handshake failed: {0}")]
    Handshake(String),
    #[error("certificate verification failed: {0}")]
    Verification(String),
    #[error("no certificate was presented by the server")]
    NoCertificate,
    #[error("certificate is not valid for {0}")]
    HostnameMismatch(String),
    #[error("transport read failed: {0}")]
    Read(#[source] std::io::Error),
    #[error("empty read, the peer closed the connection")]
    EmptyRead,
    #[error("transport write failed: {0}")]
    Write(#[source] std::io::Error),
    #[error("malformed HTTP response: {0}")]
    MalformedResponse(String),
    #[error("{0} HTTP response")]
    Status(StatusKind),
    #[error("couldn't extract {field} from {context} response: {detail}")]
    FieldExtraction {
        field: String,
        context: String,
        detail: String,
    },
    #[error("bot is not a member of any guild")]
    NoGuilds,
    #[error("no channel named {0} was found in guilds the bot is a part of")]
    ChannelNotFound(String),
}

impl Error {
    pub fn field(field: &str, context: &str, detail: impl Into<String>) -> Self {
        Self::FieldExtraction {
            field: field.to_string(),
            context: context.to_string(),
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::TrustStore(_) | Error::HandshakeSetup(_) | Error::Connect { .. } => {
                ErrorKind::TransportSetup
            }
            Error::Handshake(_)
            | Error::Verification(_)
            | Error::NoCertificate
            | Error::HostnameMismatch(_) => ErrorKind::TlsVerification,
            Error::Read(_) | Error::EmptyRead | Error::Write(_) => ErrorKind::TransportIo,
            Error::MalformedResponse(_) => ErrorKind::ProtocolFraming,
            Error::Status(_) => ErrorKind::HttpStatus,
            Error::FieldExtraction { .. } => ErrorKind::FieldExtraction,
            Error::NoGuilds | Error::ChannelNotFound(_) => ErrorKind::LogicalPrecondition,
        }
    }

    /// Soft failures restart the session instead of counting as fatal.
    pub fn is_soft(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::TransportIo | ErrorKind::ProtocolFraming | ErrorKind::FieldExtraction
        )
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Error::TrustStore(_) => 10,
            Error::HandshakeSetup(_) => 20,
            Error::Connect { .. } => 21,
            Error::Handshake(_) => 30,
            Error::Verification(_) => 40,
            Error::NoCertificate => 41,
            Error::HostnameMismatch(_) => 42,
            Error::Read(_) => 100,
            Error::EmptyRead => 101,
            Error::Write(_) => 102,
            Error::MalformedResponse(_) => 200,
            Error::Status(kind) => kind.exit_code(),
            Error::FieldExtraction { .. } => 240,
            Error::NoGuilds => 250,
            Error::ChannelNotFound(_) => 251,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
