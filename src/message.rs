// src/message.rs
use serde_json::Value;

use crate::error::{Error, Result};

/// One channel message, reduced to what the echo loop needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: u64,
    pub author_id: u64,
    pub author_name: String,
    pub content: String,
}

impl Message {
    pub fn is_authored_by(&self, user_id: u64) -> bool {
        self.author_id == user_id
    }

    /// Case-insensitive substring check on the author's username.
    pub fn author_looks_like_bot(&self, marker: &str) -> bool {
        if marker.is_empty() {
            return false;
        }
        self.author_name
            .to_lowercase()
            .contains(&marker.to_lowercase())
    }

    /// Text posted back to the channel for this message.
    pub fn echo_text(&self) -> String {
        format!("echo: {} - {}", self.author_name, self.content)
    }
}

/// Parse a message listing in the order the API returned it (newest first).
pub fn parse_messages_response(json: &Value) -> Result<Vec<Message>> {
    let items = json
        .as_array()
        .ok_or_else(|| Error::field("messages", "message list", "expected a JSON array"))?;

    items.iter().map(parse_message).collect()
}

fn parse_message(item: &Value) -> Result<Message> {
    const CONTEXT: &str = "message list";
    let author = item
        .get("author")
        .ok_or_else(|| Error::field("author", CONTEXT, "missing"))?;
    Ok(Message {
        id: snowflake(item, "id", CONTEXT)?,
        author_id: snowflake(author, "id", CONTEXT)
            .map_err(|_| Error::field("author.id", CONTEXT, "missing or not an id"))?,
        author_name: text(author, "username", CONTEXT)
            .map_err(|_| Error::field("author.username", CONTEXT, "missing or not a string"))?,
        content: text(item, "content", CONTEXT)?,
    })
}

/// Read an id field. The API sends ids as decimal strings; plain numbers are
/// accepted too.
pub fn snowflake(obj: &Value, field: &str, context: &str) -> Result<u64> {
    match obj.get(field) {
        Some(Value::String(s)) => s
            .parse()
            .map_err(|_| Error::field(field, context, format!("{s:?} is not an id"))),
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| Error::field(field, context, format!("{n} is not an id"))),
        Some(Value::Null) | None => Err(Error::field(field, context, "missing")),
        Some(other) => Err(Error::field(field, context, format!("unexpected value {other}"))),
    }
}

pub fn text(obj: &Value, field: &str, context: &str) -> Result<String> {
    match obj.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Null) | None => Err(Error::field(field, context, "missing")),
        Some(other) => Err(Error::field(field, context, format!("unexpected value {other}"))),
    }
}
