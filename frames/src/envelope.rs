//! Message envelopes carried in STOMP frame bodies.
//!
//! An envelope is `{type, from, content, timestamp?}`. `type` selects how
//! `content` is read: text for `chat`, `code` and `submit`, a [`DrawOp`] for
//! `draw`, nothing for `join` and `leave`.
//!
//! Decoding is lenient about the older shapes peers still publish:
//! - `participant` in place of `from`,
//! - `code` in place of `content` on code messages,
//! - chat messages with no `type` at all,
//! - bare drawing operations (`{type: "free", x0, ...}`) with no envelope.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::draw::{DrawKind, DrawOp};

/// Error returned by [`decode_envelope`].
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// The body is not valid JSON, or a field has the wrong JSON type.
    #[error("invalid envelope json: {0}")]
    Json(#[from] serde_json::Error),
    /// The body carries neither a `type` nor chat content.
    #[error("envelope has no type")]
    MissingType,
    /// `type` names no known envelope or drawing kind.
    #[error("unknown envelope type: {0}")]
    UnknownType(String),
    /// A typed envelope is missing the content its type requires.
    #[error("{0} envelope has no content")]
    MissingContent(EnvelopeKind),
}

/// Discriminant of an envelope, as written in its `type` field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnvelopeKind {
    Join,
    Leave,
    Chat,
    Code,
    Submit,
    Draw,
}

impl EnvelopeKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::Leave => "leave",
            Self::Chat => "chat",
            Self::Code => "code",
            Self::Submit => "submit",
            Self::Draw => "draw",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "join" => Some(Self::Join),
            "leave" => Some(Self::Leave),
            "chat" => Some(Self::Chat),
            "code" => Some(Self::Code),
            "submit" => Some(Self::Submit),
            "draw" => Some(Self::Draw),
            _ => None,
        }
    }
}

impl fmt::Display for EnvelopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed envelope content.
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    /// Participant announced themselves on the room topic.
    Join,
    /// Participant left the room.
    Leave,
    /// Free-text chat line.
    Chat(String),
    /// Full source text of the shared editor.
    Code(String),
    /// Final code handed in for review.
    Submit(String),
    /// One whiteboard primitive to replay.
    Draw(DrawOp),
}

impl Body {
    #[must_use]
    pub fn kind(&self) -> EnvelopeKind {
        match self {
            Self::Join => EnvelopeKind::Join,
            Self::Leave => EnvelopeKind::Leave,
            Self::Chat(_) => EnvelopeKind::Chat,
            Self::Code(_) => EnvelopeKind::Code,
            Self::Submit(_) => EnvelopeKind::Submit,
            Self::Draw(_) => EnvelopeKind::Draw,
        }
    }
}

/// The message unit exchanged over a topic. Immutable once sent.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    pub body: Body,
    /// Sender display name. Absent on anonymous drawing operations.
    pub from: Option<String>,
    /// Milliseconds since the Unix epoch when the sender built the envelope.
    pub timestamp: Option<i64>,
}

/// Current time as milliseconds since Unix epoch.
fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

impl Envelope {
    /// Build an envelope stamped with the current time.
    #[must_use]
    pub fn new(body: Body, from: impl Into<String>) -> Self {
        Self { body, from: Some(from.into()), timestamp: Some(now_ms()) }
    }

    #[must_use]
    pub fn join(from: &str) -> Self {
        Self::new(Body::Join, from)
    }

    #[must_use]
    pub fn leave(from: &str) -> Self {
        Self::new(Body::Leave, from)
    }

    #[must_use]
    pub fn chat(from: &str, content: &str) -> Self {
        Self::new(Body::Chat(content.to_owned()), from)
    }

    #[must_use]
    pub fn code(from: &str, content: &str) -> Self {
        Self::new(Body::Code(content.to_owned()), from)
    }

    #[must_use]
    pub fn submit(from: &str, content: &str) -> Self {
        Self::new(Body::Submit(content.to_owned()), from)
    }

    #[must_use]
    pub fn draw(from: &str, op: DrawOp) -> Self {
        Self::new(Body::Draw(op), from)
    }

    #[must_use]
    pub fn kind(&self) -> EnvelopeKind {
        self.body.kind()
    }

    /// Sender name, or `"anonymous"` when the envelope carries none.
    #[must_use]
    pub fn sender(&self) -> &str {
        self.from.as_deref().unwrap_or("anonymous")
    }
}

#[derive(Serialize, Deserialize)]
struct WireEnvelope {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, alias = "participant", skip_serializing_if = "Option::is_none")]
    from: Option<String>,
    #[serde(default, alias = "code", skip_serializing_if = "Option::is_none")]
    content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<i64>,
}

/// Encode an envelope as a JSON body.
#[must_use]
pub fn encode_envelope(envelope: &Envelope) -> String {
    let content = match &envelope.body {
        Body::Join | Body::Leave => None,
        Body::Chat(text) | Body::Code(text) | Body::Submit(text) => Some(Value::String(text.clone())),
        Body::Draw(op) => Some(draw_to_value(op)),
    };
    let wire = WireEnvelope {
        kind: Some(envelope.kind().as_str().to_owned()),
        from: envelope.from.clone(),
        content,
        timestamp: envelope.timestamp,
    };
    // Serializing a struct of strings, integers and a `Value` cannot fail.
    serde_json::to_string(&wire).unwrap_or_default()
}

/// Decode a JSON body into an envelope.
///
/// # Errors
///
/// Returns [`EnvelopeError`] for invalid JSON, unknown types, or typed
/// envelopes missing their content.
pub fn decode_envelope(body: &str) -> Result<Envelope, EnvelopeError> {
    let value: Value = serde_json::from_str(body)?;

    let bare_draw = value
        .get("type")
        .and_then(Value::as_str)
        .and_then(DrawKind::from_wire)
        .is_some();
    if bare_draw {
        let op: DrawOp = serde_json::from_value(value)?;
        return Ok(Envelope { body: Body::Draw(op), from: None, timestamp: None });
    }

    let wire: WireEnvelope = serde_json::from_value(value)?;
    let kind = match wire.kind.as_deref() {
        Some(raw) => EnvelopeKind::parse(raw).ok_or_else(|| EnvelopeError::UnknownType(raw.to_owned()))?,
        None if wire.content.is_some() => EnvelopeKind::Chat,
        None => return Err(EnvelopeError::MissingType),
    };

    let body = match kind {
        EnvelopeKind::Join => Body::Join,
        EnvelopeKind::Leave => Body::Leave,
        EnvelopeKind::Chat => Body::Chat(text_content(kind, wire.content)?),
        EnvelopeKind::Code => Body::Code(text_content(kind, wire.content)?),
        EnvelopeKind::Submit => Body::Submit(text_content(kind, wire.content)?),
        EnvelopeKind::Draw => {
            let content = wire.content.ok_or(EnvelopeError::MissingContent(kind))?;
            Body::Draw(serde_json::from_value(content)?)
        }
    };

    Ok(Envelope { body, from: wire.from, timestamp: wire.timestamp })
}

fn text_content(kind: EnvelopeKind, content: Option<Value>) -> Result<String, EnvelopeError> {
    match content {
        Some(Value::String(text)) => Ok(text),
        Some(other) => Ok(other.to_string()),
        None => Err(EnvelopeError::MissingContent(kind)),
    }
}

fn draw_to_value(op: &DrawOp) -> Value {
    serde_json::to_value(op).unwrap_or(Value::Null)
}

#[cfg(test)]
#[path = "envelope_test.rs"]
mod tests;
