//! Room and interview-session identifiers.

use std::fmt;
use std::str::FromStr;

use rand::Rng;

/// Length of a freshly generated room id.
pub const ROOM_ID_LEN: usize = 8;

const ROOM_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("room id is empty")]
    Empty,
    /// Ids are embedded in topic paths, so separators and whitespace are refused.
    #[error("room id {0:?} contains '/' or whitespace")]
    InvalidChar(String),
    #[error("session code {0:?} is not of the form room-code:access-code")]
    MalformedSession(String),
}

/// Identifier of a collaboration room, used verbatim in topic names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(String);

impl RoomId {
    /// Validate a room id.
    ///
    /// # Errors
    ///
    /// Returns [`IdError`] for empty ids and ids containing `/` or whitespace.
    pub fn new(raw: impl Into<String>) -> Result<Self, IdError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(IdError::Empty);
        }
        if raw.chars().any(|c| c == '/' || c.is_whitespace()) {
            return Err(IdError::InvalidChar(raw));
        }
        Ok(Self(raw))
    }

    /// Random id of [`ROOM_ID_LEN`] lowercase base-36 characters.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let id = (0..ROOM_ID_LEN)
            .map(|_| char::from(ROOM_ID_ALPHABET[rng.random_range(0..ROOM_ID_ALPHABET.len())]))
            .collect();
        Self(id)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoomId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// An interview room code paired with its access code.
///
/// Written as `room-code:access-code`. Both halves are required; the room
/// code names the shared channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionCode {
    pub room_code: RoomId,
    pub access_code: String,
}

impl SessionCode {
    /// # Errors
    ///
    /// Returns [`IdError`] when the room code is invalid or the access code is
    /// empty.
    pub fn new(room_code: &str, access_code: &str) -> Result<Self, IdError> {
        let access_code = access_code.trim();
        if access_code.is_empty() || access_code.contains(':') {
            return Err(IdError::MalformedSession(format!("{room_code}:{access_code}")));
        }
        Ok(Self { room_code: RoomId::new(room_code.trim())?, access_code: access_code.to_owned() })
    }
}

impl fmt::Display for SessionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.room_code, self.access_code)
    }
}

impl FromStr for SessionCode {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((room, access)) = s.split_once(':') else {
            return Err(IdError::MalformedSession(s.to_owned()));
        };
        Self::new(room, access).map_err(|_| IdError::MalformedSession(s.to_owned()))
    }
}

#[cfg(test)]
#[path = "ids_test.rs"]
mod tests;
