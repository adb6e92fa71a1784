//! Real-time room synchronization for collaborative coding interviews.
//!
//! A room carries a shared code editor, chat and a participant list over one
//! STOMP channel; the whiteboard rides a second channel. Peers converge by
//! full-text overwrite for code and by operation replay for drawings.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`transport`] | `Transport` seam and the WebSocket implementation |
//! | [`broker`] | In-process STOMP broker used by the relay, demo and tests |
//! | [`channel`] | Channel manager: connection lifecycle, subscriptions, events |
//! | [`sync`] | Document sync adapter over a channel |
//! | [`code`] | Shared code document and editor languages |
//! | [`whiteboard`] | Whiteboard as a shared document |
//! | [`presence`] | Participant tracker |
//! | [`chat`] | Chat relay log |
//! | [`session`] | Room and whiteboard sessions |
//! | [`api`] | REST client for the backend |
//! | [`store`] | Persisted client state |
//! | [`config`] | `ROOMSYNC_*` environment configuration |
//! | [`ids`] | Room ids and session codes |
//! | [`topic`] | Topic and destination naming |

pub mod api;
pub mod broker;
pub mod channel;
pub mod chat;
pub mod code;
pub mod config;
pub mod ids;
pub mod presence;
pub mod session;
pub mod store;
pub mod sync;
pub mod topic;
pub mod transport;
pub mod whiteboard;

pub use channel::{ChannelError, ChannelEvent, ChannelManager, ConnectionState};
pub use config::SyncConfig;
pub use ids::{RoomId, SessionCode};
pub use session::{RoomSession, RoomUpdate, WhiteboardSession, WhiteboardUpdate};
