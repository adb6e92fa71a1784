//! Document sync adapter: keeps one shared document converged over a channel.
//!
//! DESIGN
//! ======
//! The adapter owns the local document and drives it through
//! `Idle -> Joining -> Synced -> Detached`. While `Synced`, every local edit
//! is applied optimistically and published as exactly one envelope, and every
//! inbound envelope is authoritative: code overwrites the local text, drawing
//! operations are replayed in receipt order. Outside `Synced`, edits apply
//! locally and publish nothing, and inbound envelopes are ignored.
//!
//! Conflict policy is last-message-wins for code and additive replay for
//! drawings; concurrent overlapping edits may diverge.

use frames::{Body, Envelope};
use tracing::{debug, info};

use crate::channel::{ChannelError, ChannelManager};
use crate::topic::ChannelContext;

/// A document that can be edited locally and updated from remote envelopes.
pub trait SharedDocument {
    /// One local edit event.
    type Edit;

    /// Apply a local edit. Returns the body to publish, or `None` when the
    /// edit produces nothing to share.
    fn apply_local(&mut self, edit: Self::Edit) -> Option<Body>;

    /// Apply a remote envelope. Returns `true` when it changed the document.
    fn apply_remote(&mut self, envelope: &Envelope) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Joining,
    Synced,
    Detached,
}

/// Pairs a [`SharedDocument`] with the channel it is shared over.
pub struct DocumentSync<D> {
    doc: D,
    state: SyncState,
    published: u64,
}

impl<D: SharedDocument> DocumentSync<D> {
    #[must_use]
    pub fn new(doc: D) -> Self {
        Self { doc, state: SyncState::Idle, published: 0 }
    }

    #[must_use]
    pub fn state(&self) -> SyncState {
        self.state
    }

    #[must_use]
    pub fn document(&self) -> &D {
        &self.doc
    }

    /// Envelopes published since creation.
    #[must_use]
    pub fn published(&self) -> u64 {
        self.published
    }

    /// Join the shared document: connect the channel (a no-op when it is
    /// already connected) and make sure the context topic is subscribed.
    ///
    /// # Errors
    ///
    /// Returns the [`ChannelError`] from connecting. The adapter goes back to
    /// `Idle` so the caller may retry.
    pub async fn join(&mut self, channel: &mut ChannelManager, context: &ChannelContext) -> Result<(), ChannelError> {
        if self.state == SyncState::Synced {
            return Ok(());
        }
        self.state = SyncState::Joining;
        if let Err(e) = channel.connect(context).await {
            self.state = SyncState::Idle;
            return Err(e);
        }
        channel.subscribe(&context.topic);
        self.state = SyncState::Synced;
        info!(topic = %context.topic, "document synced");
        Ok(())
    }

    /// Apply a local edit and, while `Synced`, publish it.
    ///
    /// Returns `true` when an envelope was handed to the channel.
    pub fn edit(&mut self, channel: &mut ChannelManager, edit: D::Edit) -> bool {
        let Some(body) = self.doc.apply_local(edit) else {
            return false;
        };
        if self.state != SyncState::Synced {
            debug!(state = ?self.state, kind = %body.kind(), "local edit not published");
            return false;
        }
        let sent = channel.send(&Envelope::new(body, channel.participant()), None);
        if sent {
            self.published += 1;
        }
        sent
    }

    /// Apply an inbound envelope while `Synced`.
    pub fn apply(&mut self, envelope: &Envelope) -> bool {
        if self.state != SyncState::Synced {
            debug!(state = ?self.state, kind = %envelope.kind(), "remote update ignored");
            return false;
        }
        self.doc.apply_remote(envelope)
    }

    /// Local edits that bypass publishing, such as whiteboard undo.
    pub fn document_mut(&mut self) -> &mut D {
        &mut self.doc
    }

    /// The channel failed: return to `Idle` so the document can be re-joined.
    pub fn reset(&mut self) {
        if self.state != SyncState::Detached {
            self.state = SyncState::Idle;
        }
    }

    /// Stop synchronizing for good.
    pub fn detach(&mut self) {
        self.state = SyncState::Detached;
    }
}

#[cfg(test)]
#[path = "sync_test.rs"]
mod tests;
