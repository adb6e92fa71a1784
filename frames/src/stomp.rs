//! STOMP 1.2 text frame codec.
//!
//! A frame is a command line, zero or more `name:value` header lines, a blank
//! line, a body, and a terminating NUL octet. Header values are escaped on
//! every frame except `CONNECT` and `CONNECTED`. A payload made only of line
//! breaks is a heart-beat and decodes to `None`.

use std::fmt;

/// Header carrying the target topic or application destination.
pub const HEADER_DESTINATION: &str = "destination";

/// Header carrying a subscription id on `SUBSCRIBE` and `MESSAGE` frames.
pub const HEADER_SUBSCRIPTION: &str = "subscription";

/// Header carrying the broker-assigned id on `MESSAGE` frames.
pub const HEADER_MESSAGE_ID: &str = "message-id";

/// Header carrying the human-readable reason on `ERROR` frames.
pub const HEADER_MESSAGE: &str = "message";

/// Error returned by [`decode_frame`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// No NUL octet terminates the frame.
    #[error("frame is missing the NUL terminator")]
    Unterminated,
    /// The frame has no command line.
    #[error("frame has no command line")]
    MissingCommand,
    /// The command line is not a STOMP 1.2 command.
    #[error("unknown STOMP command: {0}")]
    UnknownCommand(String),
    /// A header line has no `:` separator.
    #[error("malformed header line: {0}")]
    MalformedHeader(String),
    /// A header contains an escape sequence STOMP 1.2 does not define.
    #[error("invalid escape sequence in header: {0}")]
    InvalidEscape(String),
}

/// STOMP 1.2 frame command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    Connect,
    Stomp,
    Connected,
    Send,
    Subscribe,
    Unsubscribe,
    Message,
    Receipt,
    Error,
    Disconnect,
}

impl Command {
    /// Command keyword as written on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Stomp => "STOMP",
            Self::Connected => "CONNECTED",
            Self::Send => "SEND",
            Self::Subscribe => "SUBSCRIBE",
            Self::Unsubscribe => "UNSUBSCRIBE",
            Self::Message => "MESSAGE",
            Self::Receipt => "RECEIPT",
            Self::Error => "ERROR",
            Self::Disconnect => "DISCONNECT",
        }
    }

    fn parse(raw: &str) -> Result<Self, CodecError> {
        match raw {
            "CONNECT" => Ok(Self::Connect),
            "STOMP" => Ok(Self::Stomp),
            "CONNECTED" => Ok(Self::Connected),
            "SEND" => Ok(Self::Send),
            "SUBSCRIBE" => Ok(Self::Subscribe),
            "UNSUBSCRIBE" => Ok(Self::Unsubscribe),
            "MESSAGE" => Ok(Self::Message),
            "RECEIPT" => Ok(Self::Receipt),
            "ERROR" => Ok(Self::Error),
            "DISCONNECT" => Ok(Self::Disconnect),
            other => Err(CodecError::UnknownCommand(other.to_owned())),
        }
    }

    /// `CONNECT`, `STOMP` and `CONNECTED` frames carry raw header values.
    fn escapes_headers(self) -> bool {
        !matches!(self, Self::Connect | Self::Stomp | Self::Connected)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single STOMP frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StompFrame {
    pub command: Command,
    /// Headers in wire order. Repeated names are allowed; the first wins on lookup.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl StompFrame {
    #[must_use]
    pub fn new(command: Command) -> Self {
        Self { command, headers: Vec::new(), body: String::new() }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Value of the first header named `name`.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Destination header, if present.
    #[must_use]
    pub fn destination(&self) -> Option<&str> {
        self.header(HEADER_DESTINATION)
    }

    /// Client handshake. Heart-beating is disabled in both directions.
    #[must_use]
    pub fn connect(host: &str) -> Self {
        Self::new(Command::Connect)
            .with_header("accept-version", "1.2")
            .with_header("host", host)
            .with_header("heart-beat", "0,0")
    }

    /// Broker handshake reply.
    #[must_use]
    pub fn connected() -> Self {
        Self::new(Command::Connected)
            .with_header("version", "1.2")
            .with_header("heart-beat", "0,0")
    }

    #[must_use]
    pub fn subscribe(id: &str, destination: &str) -> Self {
        Self::new(Command::Subscribe)
            .with_header("id", id)
            .with_header(HEADER_DESTINATION, destination)
            .with_header("ack", "auto")
    }

    #[must_use]
    pub fn unsubscribe(id: &str) -> Self {
        Self::new(Command::Unsubscribe).with_header("id", id)
    }

    /// Publish a JSON body to `destination`.
    #[must_use]
    pub fn send(destination: &str, body: impl Into<String>) -> Self {
        Self::new(Command::Send)
            .with_header(HEADER_DESTINATION, destination)
            .with_header("content-type", "application/json")
            .with_body(body)
    }

    /// Broker delivery of a published body to one subscription.
    #[must_use]
    pub fn message(destination: &str, subscription: &str, message_id: &str, body: impl Into<String>) -> Self {
        Self::new(Command::Message)
            .with_header(HEADER_DESTINATION, destination)
            .with_header(HEADER_SUBSCRIPTION, subscription)
            .with_header(HEADER_MESSAGE_ID, message_id)
            .with_header("content-type", "application/json")
            .with_body(body)
    }

    #[must_use]
    pub fn error(message: &str) -> Self {
        Self::new(Command::Error).with_header(HEADER_MESSAGE, message)
    }

    #[must_use]
    pub fn disconnect() -> Self {
        Self::new(Command::Disconnect)
    }
}

/// Encode a frame into its wire text, including the trailing NUL.
///
/// A `content-length` header is emitted for non-empty bodies unless the
/// caller already supplied one.
#[must_use]
pub fn encode_frame(frame: &StompFrame) -> String {
    let escape = frame.command.escapes_headers();
    let mut out = String::with_capacity(64 + frame.body.len());
    out.push_str(frame.command.as_str());
    out.push('\n');
    for (name, value) in &frame.headers {
        if escape {
            out.push_str(&escape_header(name));
            out.push(':');
            out.push_str(&escape_header(value));
        } else {
            out.push_str(name);
            out.push(':');
            out.push_str(value);
        }
        out.push('\n');
    }
    if !frame.body.is_empty() && frame.header("content-length").is_none() {
        out.push_str("content-length:");
        out.push_str(&frame.body.len().to_string());
        out.push('\n');
    }
    out.push('\n');
    out.push_str(&frame.body);
    out.push('\0');
    out
}

/// Decode one frame from wire text.
///
/// Returns `Ok(None)` for heart-beats (payloads made only of line breaks).
///
/// # Errors
///
/// Returns a [`CodecError`] when the text is not a well-formed STOMP 1.2 frame.
pub fn decode_frame(raw: &str) -> Result<Option<StompFrame>, CodecError> {
    let trimmed = raw.trim_start_matches(['\r', '\n']);
    if trimmed.is_empty() {
        return Ok(None);
    }
    let Some(end) = trimmed.rfind('\0') else {
        return Err(CodecError::Unterminated);
    };
    let mut rest = &trimmed[..end];

    let command = match take_line(&mut rest) {
        Some(line) if !line.is_empty() => Command::parse(line)?,
        _ => return Err(CodecError::MissingCommand),
    };

    let mut headers = Vec::new();
    while let Some(line) = take_line(&mut rest) {
        if line.is_empty() {
            break;
        }
        let Some((name, value)) = line.split_once(':') else {
            return Err(CodecError::MalformedHeader(line.to_owned()));
        };
        if command.escapes_headers() {
            headers.push((unescape_header(name)?, unescape_header(value)?));
        } else {
            headers.push((name.to_owned(), value.to_owned()));
        }
    }

    let frame = StompFrame { command, headers, body: String::new() };
    let body = frame
        .header("content-length")
        .and_then(|len| len.parse::<usize>().ok())
        .and_then(|len| rest.get(..len))
        .unwrap_or(rest);

    Ok(Some(StompFrame { body: body.to_owned(), ..frame }))
}

/// Split the next line off `rest`, tolerating `\r\n` line endings.
fn take_line<'a>(rest: &mut &'a str) -> Option<&'a str> {
    if rest.is_empty() {
        return None;
    }
    let current = *rest;
    let (line, tail) = current.split_once('\n').unwrap_or((current, ""));
    *rest = tail;
    Some(line.strip_suffix('\r').unwrap_or(line))
}

fn escape_header(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            other => out.push(other),
        }
    }
    out
}

fn unescape_header(raw: &str) -> Result<String, CodecError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            _ => return Err(CodecError::InvalidEscape(raw.to_owned())),
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "stomp_test.rs"]
mod tests;
