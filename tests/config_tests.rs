// tests/config_tests.rs
use isabot::config::{config_path, load_config, save_config, AgentConfig, Credential};
use std::time::Duration;

#[test]
fn test_config_defaults() {
    let config = AgentConfig::default();
    assert_eq!(config.host, "discord.com");
    assert_eq!(config.port, 443);
    assert_eq!(config.channel, "isa-bot");
    assert_eq!(config.auth_scheme, "Bearer");
    assert_eq!(config.poll_interval(), Duration::from_secs(1));
    assert_eq!(config.backoff(), Duration::from_secs(2));
    assert_eq!(config.bot_name_marker, "bot");
    assert!(!config.verbose);
}

#[test]
fn test_config_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = config_path(dir.path());

    let config = AgentConfig {
        channel: "echo-room".to_string(),
        auth_scheme: "Bot".to_string(),
        poll_interval_ms: 250,
        max_fatal_failures: 1,
        ..Default::default()
    };

    save_config(&path, &config).unwrap();
    let loaded = load_config(&path).unwrap().unwrap();

    assert_eq!(loaded.channel, "echo-room");
    assert_eq!(loaded.auth_scheme, "Bot");
    assert_eq!(loaded.poll_interval_ms, 250);
    assert_eq!(loaded.max_fatal_failures, 1);
    assert_eq!(loaded.host, "discord.com");
}

#[test]
fn test_config_load_missing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nonexistent.toml");
    let loaded = load_config(&path).unwrap();
    assert!(loaded.is_none());
}

#[test]
fn test_config_partial_toml_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = config_path(dir.path());
    std::fs::write(&path, "channel = \"bots-only\"\nbackoff_ms = 500\n").unwrap();

    let loaded = load_config(&path).unwrap().unwrap();
    assert_eq!(loaded.channel, "bots-only");
    assert_eq!(loaded.backoff(), Duration::from_millis(500));
    assert_eq!(loaded.poll_interval_ms, 1000); // default
    assert_eq!(loaded.max_soft_restarts, 5); // default
}

#[test]
fn test_config_invalid_toml_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = config_path(dir.path());
    std::fs::write(&path, "port = \"not a number\"\n").unwrap();
    assert!(load_config(&path).is_err());
}

#[test]
fn test_route_joins_prefix() {
    let config = AgentConfig {
        api_prefix: "/api/v10/".to_string(),
        ..Default::default()
    };
    assert_eq!(config.route("/users/@me"), "/api/v10/users/@me");
}

#[test]
fn test_credential_is_redacted() {
    let credential = Credential::new("super-secret");
    assert_eq!(credential.authorization("Bot"), "Bot super-secret");
    assert!(!format!("{credential:?}").contains("super-secret"));
}
