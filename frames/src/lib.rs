//! Shared wire model for the realtime room bus.
//!
//! This crate owns everything that crosses the wire between a room client and
//! the STOMP broker: the text frame codec, the JSON message envelopes carried
//! in frame bodies, and the drawing operations replayed by whiteboard peers.
//! It performs no I/O.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`stomp`] | STOMP 1.2 text frames: commands, headers, escaping |
//! | [`envelope`] | `{type, from, content, timestamp}` message envelopes |
//! | [`draw`] | Drawing primitives and their wire form |

pub mod draw;
pub mod envelope;
pub mod stomp;

pub use draw::{DrawKind, DrawOp, Point, Tool};
pub use envelope::{Body, Envelope, EnvelopeError, EnvelopeKind, decode_envelope, encode_envelope};
pub use stomp::{
    CodecError, Command, HEADER_DESTINATION, HEADER_MESSAGE, HEADER_MESSAGE_ID, HEADER_SUBSCRIPTION, StompFrame,
    decode_frame, encode_frame,
};
