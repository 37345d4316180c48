//! Best-effort field access over one exported conversation.
//!
//! The export schema is not validated. Every lookup carries its own default
//! and a JSON `null` counts as absent.

use serde_json::{Map, Value};

pub const UNKNOWN_ID: &str = "unknown";
pub const UNTITLED: &str = "Untitled";

/// Sender role of one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Human,
    Assistant,
    Other,
}

impl Role {
    pub fn from_sender(sender: &str) -> Self {
        match sender {
            "human" => Role::Human,
            "assistant" => Role::Assistant,
            _ => Role::Other,
        }
    }
}

/// One raw conversation as decoded from the export.
#[derive(Debug, Clone)]
pub struct RawConversation(Value);

impl RawConversation {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn id(&self) -> String {
        text_field(&self.0, "uuid").unwrap_or_else(|| UNKNOWN_ID.to_string())
    }

    /// Raw creation timestamp, `None` when absent or empty.
    pub fn created_at(&self) -> Option<String> {
        text_field(&self.0, "created_at").filter(|value| !value.is_empty())
    }

    pub fn title(&self) -> String {
        text_field(&self.0, "name").unwrap_or_else(|| UNTITLED.to_string())
    }

    /// The message sequence. `Ok(&[])` when absent, `Err` when present but
    /// not an array.
    pub fn messages(&self) -> Result<&[Value], &'static str> {
        match self.0.get("chat_messages") {
            None | Some(Value::Null) => Ok(&[]),
            Some(Value::Array(items)) => Ok(items.as_slice()),
            Some(_) => Err("chat_messages is not an array"),
        }
    }
}

/// A view over one message object.
#[derive(Debug, Clone, Copy)]
pub struct RawMessage<'a>(&'a Map<String, Value>);

impl<'a> RawMessage<'a> {
    pub fn from_value(value: &'a Value) -> Option<Self> {
        value.as_object().map(RawMessage)
    }

    pub fn role(&self) -> Role {
        match self.0.get("sender") {
            Some(Value::String(sender)) => Role::from_sender(sender),
            _ => Role::Other,
        }
    }

    /// Message text. Falls back to the text blocks of `content` when the
    /// `text` field is absent or empty.
    pub fn text(&self) -> String {
        if let Some(text) = self.0.get("text").and_then(scalar_text) {
            if !text.is_empty() {
                return text;
            }
        }
        let Some(Value::Array(blocks)) = self.0.get("content") else {
            return String::new();
        };
        let parts: Vec<&str> = blocks
            .iter()
            .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
            .filter_map(|block| block.get("text").and_then(Value::as_str))
            .collect();
        parts.join("\n")
    }
}

fn text_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(scalar_text)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
