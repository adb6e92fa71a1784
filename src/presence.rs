//! Participant list derived from join/leave envelopes and backend fetches.

use async_trait::async_trait;
use frames::{Body, Envelope};
use tracing::debug;

use crate::api::ApiError;
use crate::ids::RoomId;

/// Where the authoritative participant list comes from.
#[async_trait]
pub trait ParticipantSource: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ApiError`] when the list cannot be fetched.
    async fn fetch_participants(&self, room: &RoomId) -> Result<Vec<String>, ApiError>;
}

/// A change to the participant list caused by one envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceChange {
    Joined(String),
    Left(String),
}

/// Current participants by display name, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceTracker {
    participants: Vec<String>,
}

impl PresenceTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn participants(&self) -> &[String] {
        &self.participants
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.participants.iter().any(|p| p == name)
    }

    /// Replace the list wholesale with a fetch result. Duplicates are dropped.
    pub fn replace(&mut self, names: Vec<String>) {
        self.participants.clear();
        for name in names {
            if !self.contains(&name) {
                self.participants.push(name);
            }
        }
    }

    /// Adjust the list for a `join` or `leave` envelope.
    ///
    /// A join from someone already present, a leave from someone absent, and
    /// anonymous envelopes change nothing.
    pub fn observe(&mut self, envelope: &Envelope) -> Option<PresenceChange> {
        let name = envelope.from.as_deref()?;
        match envelope.body {
            Body::Join if !self.contains(name) => {
                self.participants.push(name.to_owned());
                Some(PresenceChange::Joined(name.to_owned()))
            }
            Body::Leave if self.contains(name) => {
                self.participants.retain(|p| p != name);
                Some(PresenceChange::Left(name.to_owned()))
            }
            _ => None,
        }
    }

    /// Fetch the list from `source` and replace the local one.
    ///
    /// # Errors
    ///
    /// Returns the source's [`ApiError`]; the local list is left unchanged.
    pub async fn refresh(&mut self, source: &dyn ParticipantSource, room: &RoomId) -> Result<(), ApiError> {
        let names = source.fetch_participants(room).await?;
        debug!(%room, count = names.len(), "participants refreshed");
        self.replace(names);
        Ok(())
    }
}

#[cfg(test)]
#[path = "presence_test.rs"]
mod tests;
