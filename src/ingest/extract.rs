use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ingest::raw::{RawConversation, RawMessage, Role};

pub const FULL_TEXT_LIMIT: usize = 10_000;
pub const PREVIEW_LIMIT: usize = 500;
pub const TRUNCATION_MARKER: &str = "...[TRUNCATED]";
pub const PREVIEW_SUFFIX: &str = "...";

const SAMPLE_MESSAGES: usize = 3;
const MESSAGE_SEPARATOR: &str = "\n---\n";
const HUMAN_HEADER: &str = "USER MESSAGES:\n";
const ASSISTANT_HEADER: &str = "\n\nCLAUDE RESPONSES:\n";

/// Flat, size-bounded summary of one conversation. Field order is the CSV
/// column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub identifier: String,
    pub date: String,
    pub title: String,
    pub message_count: u64,
    pub user_message_count: u64,
    pub assistant_response_count: u64,
    pub total_characters: u64,
    pub preview: String,
    pub full_text: String,
}

/// Builds the summary for one conversation, or `None` when it has no
/// messages or cannot be read. Failures are logged, never returned.
pub fn extract(raw: &RawConversation) -> Option<SummaryRecord> {
    match try_extract(raw) {
        Ok(record) => record,
        Err(err) => {
            warn!("Error processing conversation {}: {err}", raw.id());
            None
        }
    }
}

pub fn try_extract(raw: &RawConversation) -> Result<Option<SummaryRecord>> {
    let identifier = raw.id();
    let messages = raw.messages().map_err(|reason| Error::MalformedRecord {
        id: identifier.clone(),
        reason: reason.to_string(),
    })?;
    if messages.is_empty() {
        return Ok(None);
    }

    let mut human = Vec::new();
    let mut assistant = Vec::new();
    let mut total_characters = 0u64;

    for (idx, value) in messages.iter().enumerate() {
        let message = RawMessage::from_value(value).ok_or_else(|| Error::MalformedRecord {
            id: identifier.clone(),
            reason: format!("message {idx} is not an object"),
        })?;
        let text = message.text();
        total_characters += text.chars().count() as u64;
        match message.role() {
            Role::Human => human.push(text),
            Role::Assistant => assistant.push(text),
            Role::Other => {}
        }
    }

    let full_text = truncate_with_marker(&compose_text(&human, &assistant));
    let preview = preview_of(&full_text);
    let created_at = raw.created_at().unwrap_or_default();

    Ok(Some(SummaryRecord {
        identifier,
        date: normalize_date(&created_at).to_string(),
        title: raw.title(),
        message_count: messages.len() as u64,
        user_message_count: human.len() as u64,
        assistant_response_count: assistant.len() as u64,
        total_characters,
        preview,
        full_text,
    }))
}

/// Calendar date part of a timestamp: everything before the date/time
/// separator, which is the same set `parse_created_at` accepts.
pub fn normalize_date(timestamp: &str) -> &str {
    match timestamp.find(&['T', 't', ' '][..]) {
        Some(idx) => &timestamp[..idx],
        None => timestamp,
    }
}

fn compose_text(human: &[String], assistant: &[String]) -> String {
    let sample = |items: &[String]| {
        items
            .iter()
            .take(SAMPLE_MESSAGES)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(MESSAGE_SEPARATOR)
    };
    format!(
        "{HUMAN_HEADER}{}{ASSISTANT_HEADER}{}",
        sample(human),
        sample(assistant)
    )
}

fn truncate_with_marker(text: &str) -> String {
    match char_boundary(text, FULL_TEXT_LIMIT) {
        Some(end) => format!("{}{TRUNCATION_MARKER}", &text[..end]),
        None => text.to_string(),
    }
}

// The suffix is unconditional; it does not signal truncation.
fn preview_of(text: &str) -> String {
    let flattened = text.replace(&['\n', '\r'][..], " ");
    let end = char_boundary(&flattened, PREVIEW_LIMIT).unwrap_or(flattened.len());
    format!("{}{PREVIEW_SUFFIX}", &flattened[..end])
}

/// Byte offset of the `limit`-th character, or `None` if the text has at
/// most `limit` characters.
fn char_boundary(text: &str, limit: usize) -> Option<usize> {
    text.char_indices().nth(limit).map(|(idx, _)| idx)
}
