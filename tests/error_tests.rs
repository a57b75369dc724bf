// tests/error_tests.rs
use isabot::error::{Error, ErrorKind, StatusKind};

fn io(kind: std::io::ErrorKind) -> std::io::Error {
    std::io::Error::new(kind, "boom")
}

fn all_errors() -> Vec<Error> {
    vec![
        Error::TrustStore("empty".into()),
        Error::HandshakeSetup("bad name".into()),
        Error::Connect {
            host: "discord.com".into(),
            port: 443,
            source: io(std::io::ErrorKind::ConnectionRefused),
        },
        Error::Handshake("alert".into()),
        Error::Verification("expired".into()),
        Error::NoCertificate,
        Error::HostnameMismatch("discord.com".into()),
        Error::Read(io(std::io::ErrorKind::ConnectionReset)),
        Error::EmptyRead,
        Error::Write(io(std::io::ErrorKind::BrokenPipe)),
        Error::MalformedResponse("no status".into()),
        Error::Status(StatusKind::BadRequest),
        Error::Status(StatusKind::Unauthorized),
        Error::Status(StatusKind::Forbidden),
        Error::Status(StatusKind::NotFound),
        Error::Status(StatusKind::MethodNotAllowed),
        Error::Status(StatusKind::GatewayUnavailable),
        Error::Status(StatusKind::Unexpected(418)),
        Error::field("id", "identity", "missing"),
        Error::NoGuilds,
        Error::ChannelNotFound("isa-bot".into()),
    ]
}

#[test]
fn test_exit_codes_are_distinct_and_nonzero() {
    let mut codes: Vec<u8> = all_errors().iter().map(Error::exit_code).collect();
    assert!(codes.iter().all(|c| *c != 0));
    let total = codes.len();
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), total);
}

#[test]
fn test_soft_kinds() {
    for err in all_errors() {
        let expected = matches!(
            err.kind(),
            ErrorKind::TransportIo | ErrorKind::ProtocolFraming | ErrorKind::FieldExtraction
        );
        assert_eq!(err.is_soft(), expected, "{err}");
    }
    assert!(Error::EmptyRead.is_soft());
    assert!(!Error::HostnameMismatch("x".into()).is_soft());
    assert!(!Error::Status(StatusKind::NotFound).is_soft());
}

#[test]
fn test_tls_failures_grouped() {
    for err in [
        Error::Handshake("x".into()),
        Error::Verification("x".into()),
        Error::NoCertificate,
        Error::HostnameMismatch("x".into()),
    ] {
        assert_eq!(err.kind(), ErrorKind::TlsVerification);
    }
}

#[test]
fn test_messages_are_human_readable() {
    assert_eq!(
        Error::Status(StatusKind::NotFound).to_string(),
        "not found HTTP response"
    );
    assert_eq!(
        Error::Status(StatusKind::Unexpected(418)).to_string(),
        "unexpected status (418) HTTP response"
    );
    assert!(Error::ChannelNotFound("isa-bot".into())
        .to_string()
        .contains("isa-bot"));
}
