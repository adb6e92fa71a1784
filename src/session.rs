//! View-scoped sessions tying a channel to the documents it carries.
//!
//! DESIGN
//! ======
//! A session owns exactly one [`ChannelManager`] and everything fed by it.
//! The caller's task pulls typed updates from `next_update` and issues local
//! actions between pulls, so inbound messages and local edits never touch a
//! document at the same time.
//!
//! LIFECYCLE
//! =========
//! 1. `new`: build around a channel that has not connected yet
//! 2. `join`: connect, subscribe the context topic, announce `join`
//! 3. `next_update` / local actions, until `next_update` returns `None`
//! 4. `leave`: best-effort `leave`, then teardown
//!
//! If the channel fails for good, the document returns to `Idle` and `join`
//! may be called again.

use std::sync::Arc;
use std::time::Duration;

use canvas::engine::Whiteboard;
use frames::{Body, Envelope};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::api::ApiError;
use crate::channel::{ChannelError, ChannelEvent, ChannelManager, ConnectionState};
use crate::chat::{self, ChatError, ChatLog, ChatMessage};
use crate::code::{CodeDocument, CodeEdit, Language};
use crate::ids::RoomId;
use crate::presence::{ParticipantSource, PresenceChange, PresenceTracker};
use crate::sync::{DocumentSync, SyncState};
use crate::topic::ChannelContext;
use crate::whiteboard::WhiteboardEdit;

// =============================================================================
// ROOM SESSION
// =============================================================================

/// Something a room view should react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomUpdate {
    Connected,
    /// The shared code was overwritten by an inbound `code` message.
    CodeChanged { from: String, text: String },
    Chat(ChatMessage),
    Presence(PresenceChange),
    /// A periodic fetch replaced the participant list.
    Participants(Vec<String>),
    Submitted { from: String, content: String },
    Disconnected,
    Error(String),
}

struct Refresh {
    source: Arc<dyn ParticipantSource>,
    ticker: Interval,
}

enum Step {
    Event(Option<ChannelEvent>),
    Refresh,
}

/// Code editor, chat and presence for one room.
pub struct RoomSession {
    channel: ChannelManager,
    context: ChannelContext,
    code: DocumentSync<CodeDocument>,
    chat: ChatLog,
    presence: PresenceTracker,
    refresh: Option<Refresh>,
}

impl RoomSession {
    #[must_use]
    pub fn new(channel: ChannelManager, room: &RoomId, language: Language) -> Self {
        Self {
            channel,
            context: ChannelContext::room(room),
            code: DocumentSync::new(CodeDocument::new(language)),
            chat: ChatLog::new(),
            presence: PresenceTracker::new(),
            refresh: None,
        }
    }

    /// Refetch the participant list from `source` every `every`, starting
    /// with the first `next_update` call.
    #[must_use]
    pub fn with_refresh(mut self, source: Arc<dyn ParticipantSource>, every: Duration) -> Self {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.refresh = Some(Refresh { source, ticker });
        self
    }

    #[must_use]
    pub fn room(&self) -> &RoomId {
        &self.context.room
    }

    #[must_use]
    pub fn participant(&self) -> &str {
        self.channel.participant()
    }

    #[must_use]
    pub fn code(&self) -> &CodeDocument {
        self.code.document()
    }

    #[must_use]
    pub fn sync_state(&self) -> SyncState {
        self.code.state()
    }

    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.channel.state()
    }

    #[must_use]
    pub fn chat_log(&self) -> &[ChatMessage] {
        self.chat.messages()
    }

    #[must_use]
    pub fn participants(&self) -> &[String] {
        self.presence.participants()
    }

    /// Connect and start synchronizing the room.
    ///
    /// # Errors
    ///
    /// Returns the [`ChannelError`] from connecting.
    pub async fn join(&mut self) -> Result<(), ChannelError> {
        self.code.join(&mut self.channel, &self.context).await
    }

    /// Next update for the view, or `None` once the channel is closed.
    pub async fn next_update(&mut self) -> Option<RoomUpdate> {
        loop {
            let step = match self.refresh.as_mut() {
                Some(refresh) => tokio::select! {
                    event = self.channel.next_event() => Step::Event(event),
                    _ = refresh.ticker.tick() => Step::Refresh,
                },
                None => Step::Event(self.channel.next_event().await),
            };

            match step {
                Step::Event(None) => return None,
                Step::Event(Some(event)) => {
                    if let Some(update) = self.route(event) {
                        return Some(update);
                    }
                }
                Step::Refresh => {
                    let Some(source) = self.refresh.as_ref().map(|r| Arc::clone(&r.source)) else {
                        continue;
                    };
                    match self.refresh_participants(source.as_ref()).await {
                        Ok(names) => return Some(RoomUpdate::Participants(names.to_vec())),
                        Err(e) => warn!(room = %self.context.room, error = %e, "participant refresh failed"),
                    }
                }
            }
        }
    }

    /// Replace the editor text. Returns `true` when the edit was published.
    pub fn edit_code(&mut self, text: &str) -> bool {
        self.code.edit(&mut self.channel, CodeEdit::Replace(text.to_owned()))
    }

    /// Switch language. The text resets to the template locally only.
    pub fn set_language(&mut self, language: Language) {
        self.code.edit(&mut self.channel, CodeEdit::SetLanguage(language));
    }

    /// Send a chat line. Returns `Ok(false)` when disconnected.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Empty`] for blank input; nothing is sent.
    pub fn send_chat(&mut self, raw: &str) -> Result<bool, ChatError> {
        let envelope = chat::compose(self.channel.participant(), raw)?;
        Ok(self.channel.send(&envelope, None))
    }

    /// Submit the current code as this participant's final answer.
    pub fn submit(&mut self) -> bool {
        let envelope = Envelope::submit(self.channel.participant(), self.code.document().text());
        self.channel.send(&envelope, Some(&self.context.submit()))
    }

    /// Fetch the participant list now.
    ///
    /// # Errors
    ///
    /// Returns the source's [`ApiError`]; the current list is kept.
    pub async fn refresh_participants(&mut self, source: &dyn ParticipantSource) -> Result<&[String], ApiError> {
        self.presence.refresh(source, &self.context.room).await?;
        Ok(self.presence.participants())
    }

    /// Announce `leave` and close the channel. Safe to call repeatedly.
    pub fn leave(&mut self) {
        self.code.detach();
        self.channel.disconnect();
    }

    fn route(&mut self, event: ChannelEvent) -> Option<RoomUpdate> {
        match event {
            ChannelEvent::Connected => Some(RoomUpdate::Connected),
            ChannelEvent::Disconnected => Some(RoomUpdate::Disconnected),
            ChannelEvent::Error(reason) => {
                if self.channel.state() == ConnectionState::Failed {
                    self.code.reset();
                }
                Some(RoomUpdate::Error(reason))
            }
            ChannelEvent::Message { envelope, .. } => self.route_envelope(&envelope),
        }
    }

    fn route_envelope(&mut self, envelope: &Envelope) -> Option<RoomUpdate> {
        let from = envelope.sender().to_owned();
        match &envelope.body {
            Body::Code(_) => self
                .code
                .apply(envelope)
                .then(|| RoomUpdate::CodeChanged { from, text: self.code.document().text().to_owned() }),
            Body::Chat(_) => self.chat.observe(envelope).cloned().map(RoomUpdate::Chat),
            Body::Join | Body::Leave => self.presence.observe(envelope).map(RoomUpdate::Presence),
            Body::Submit(content) => Some(RoomUpdate::Submitted { from, content: content.clone() }),
            Body::Draw(_) => {
                debug!(%from, "drawing message on room topic ignored");
                None
            }
        }
    }
}

// =============================================================================
// WHITEBOARD SESSION
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhiteboardUpdate {
    Connected,
    /// A peer's drawing operation was replayed onto the board.
    Replayed { from: String },
    Disconnected,
    Error(String),
}

/// The shared whiteboard for one room view.
pub struct WhiteboardSession {
    channel: ChannelManager,
    context: ChannelContext,
    board: DocumentSync<Whiteboard>,
}

impl WhiteboardSession {
    #[must_use]
    pub fn new(channel: ChannelManager, room: &RoomId, width: usize, height: usize) -> Self {
        Self { channel, context: ChannelContext::whiteboard(room), board: DocumentSync::new(Whiteboard::new(width, height)) }
    }

    #[must_use]
    pub fn board(&self) -> &Whiteboard {
        self.board.document()
    }

    #[must_use]
    pub fn sync_state(&self) -> SyncState {
        self.board.state()
    }

    /// # Errors
    ///
    /// Returns the [`ChannelError`] from connecting.
    pub async fn join(&mut self) -> Result<(), ChannelError> {
        self.board.join(&mut self.channel, &self.context).await
    }

    /// Apply a local input event. Returns `true` when an operation was published.
    pub fn draw(&mut self, edit: WhiteboardEdit) -> bool {
        self.board.edit(&mut self.channel, edit)
    }

    /// Next update, or `None` once the channel is closed.
    ///
    /// Echoes of this participant's own operations are skipped; they were
    /// painted when drawn.
    pub async fn next_update(&mut self) -> Option<WhiteboardUpdate> {
        loop {
            match self.channel.next_event().await? {
                ChannelEvent::Connected => return Some(WhiteboardUpdate::Connected),
                ChannelEvent::Disconnected => return Some(WhiteboardUpdate::Disconnected),
                ChannelEvent::Error(reason) => {
                    if self.channel.state() == ConnectionState::Failed {
                        self.board.reset();
                    }
                    return Some(WhiteboardUpdate::Error(reason));
                }
                ChannelEvent::Message { envelope, .. } => {
                    if envelope.from.as_deref() == Some(self.channel.participant()) {
                        continue;
                    }
                    if self.board.apply(&envelope) {
                        return Some(WhiteboardUpdate::Replayed { from: envelope.sender().to_owned() });
                    }
                }
            }
        }
    }

    pub fn leave(&mut self) {
        self.board.detach();
        self.channel.disconnect();
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
