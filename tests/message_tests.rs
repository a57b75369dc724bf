// tests/message_tests.rs
use isabot::error::ErrorKind;
use isabot::message::{parse_messages_response, Message};

fn message(author: &str, content: &str) -> Message {
    Message {
        id: 1,
        author_id: 7,
        author_name: author.to_string(),
        content: content.to_string(),
    }
}

#[test]
fn test_parse_messages_response() {
    let json = serde_json::json!([
        {
            "id": "1100",
            "type": 0,
            "content": "Hello, \"world\"",
            "channel_id": "9",
            "author": {"id": "7", "username": "alice", "discriminator": "0"},
            "mentions": [],
            "embeds": [{"title": "x"}]
        },
        {
            "id": "1099",
            "content": "",
            "channel_id": "9",
            "author": {"id": "8", "username": "carol"}
        }
    ]);
    let messages = parse_messages_response(&json).unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].id, 1100);
    assert_eq!(messages[0].author_id, 7);
    assert_eq!(messages[0].author_name, "alice");
    assert_eq!(messages[0].content, "Hello, \"world\"");
    assert_eq!(messages[1].content, "");
}

#[test]
fn test_parse_messages_missing_content() {
    let json = serde_json::json!([{"id": "1", "author": {"id": "7", "username": "alice"}}]);
    let err = parse_messages_response(&json).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FieldExtraction);
    assert!(err.to_string().contains("content"));
}

#[test]
fn test_parse_messages_missing_username() {
    let json = serde_json::json!([{"id": "1", "content": "x", "author": {"id": "7"}}]);
    let err = parse_messages_response(&json).unwrap_err();
    assert!(err.to_string().contains("author.username"));
}

#[test]
fn test_parse_messages_not_an_array() {
    let json = serde_json::json!({"message": "You are being rate limited."});
    assert!(parse_messages_response(&json).is_err());
}

#[test]
fn test_echo_text() {
    assert_eq!(message("alice", "hi there").echo_text(), "echo: alice - hi there");
}

#[test]
fn test_bot_marker_any_case_any_position() {
    for name in ["bot", "BOT", "mybot", "Botanist", "roBoTics"] {
        assert!(message(name, "x").author_looks_like_bot("bot"), "{name}");
    }
    assert!(!message("alice", "x").author_looks_like_bot("bot"));
    assert!(!message("alice", "x").author_looks_like_bot(""));
}

#[test]
fn test_is_authored_by() {
    let msg = message("alice", "x");
    assert!(msg.is_authored_by(7));
    assert!(!msg.is_authored_by(8));
}
