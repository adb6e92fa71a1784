//! Chat relay: an append-only log of chat lines in arrival order.

use frames::{Body, Envelope};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("chat message is empty")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub from: String,
    pub content: String,
    pub timestamp: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
}

impl ChatLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Append a `chat` envelope. Other envelopes are ignored.
    pub fn observe(&mut self, envelope: &Envelope) -> Option<&ChatMessage> {
        let Body::Chat(content) = &envelope.body else {
            return None;
        };
        self.messages.push(ChatMessage {
            from: envelope.sender().to_owned(),
            content: content.clone(),
            timestamp: envelope.timestamp,
        });
        self.messages.last()
    }
}

/// Build an outbound chat envelope with trimmed content.
///
/// # Errors
///
/// Returns [`ChatError::Empty`] for empty or whitespace-only input.
pub fn compose(from: &str, raw: &str) -> Result<Envelope, ChatError> {
    let content = raw.trim();
    if content.is_empty() {
        return Err(ChatError::Empty);
    }
    Ok(Envelope::chat(from, content))
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
