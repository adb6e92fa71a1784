//! Topic and destination naming for collaboration contexts.
//!
//! Peers subscribe to `/topic/...` and publish to the matching `/app/...`
//! destination; the broker relays application destinations onto topics.

use crate::ids::RoomId;

pub const WHITEBOARD_TOPIC: &str = "/topic/drawing";
pub const WHITEBOARD_DESTINATION: &str = "/app/drawing";

/// Which shared surface a context synchronizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    /// Code editor, chat and presence for one room.
    Room,
    /// The shared whiteboard.
    Whiteboard,
}

/// Destinations a channel manager uses for one collaboration context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelContext {
    pub kind: ContextKind,
    pub room: RoomId,
    /// Canonical topic subscribed on connect.
    pub topic: String,
    /// Default destination for outbound envelopes.
    pub publish: String,
    /// Destination for the `join` announcement, if the context has presence.
    pub join: Option<String>,
    /// Destination for the `leave` announcement.
    pub leave: Option<String>,
}

impl ChannelContext {
    /// Room context: `/topic/code/{room}` in, `/app/code/{room}` out.
    #[must_use]
    pub fn room(room: &RoomId) -> Self {
        let publish = format!("/app/code/{room}");
        Self {
            kind: ContextKind::Room,
            room: room.clone(),
            topic: format!("/topic/code/{room}"),
            join: Some(format!("{publish}/join")),
            leave: Some(format!("{publish}/leave")),
            publish,
        }
    }

    /// Whiteboard context. The drawing topic is shared by every room.
    #[must_use]
    pub fn whiteboard(room: &RoomId) -> Self {
        Self {
            kind: ContextKind::Whiteboard,
            room: room.clone(),
            topic: WHITEBOARD_TOPIC.to_owned(),
            publish: WHITEBOARD_DESTINATION.to_owned(),
            join: None,
            leave: None,
        }
    }

    /// Destination for final code submissions.
    #[must_use]
    pub fn submit(&self) -> String {
        format!("{}/submit", self.publish)
    }
}

/// Topic that an application destination is relayed to.
///
/// `/app/code/r1`, `/app/code/r1/join`, `/app/code/r1/leave` and
/// `/app/code/r1/submit` all land on `/topic/code/r1`. Non-application
/// destinations are returned unchanged.
#[must_use]
pub fn relay_topic(destination: &str) -> String {
    let Some(path) = destination.strip_prefix("/app/") else {
        return destination.to_owned();
    };
    let path = ["/join", "/leave", "/submit"]
        .iter()
        .find_map(|suffix| path.strip_suffix(suffix))
        .unwrap_or(path);
    format!("/topic/{path}")
}

#[cfg(test)]
#[path = "topic_test.rs"]
mod tests;
