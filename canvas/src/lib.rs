//! Whiteboard engine for the shared drawing surface.
//!
//! This crate owns everything a whiteboard peer does locally: turning pointer
//! gestures into drawing operations, replaying local and remote operations
//! onto a deterministic raster, and keeping the linear undo/redo history of
//! full-canvas snapshots. It performs no I/O; the room layer publishes the
//! [`engine::Action`]s it returns and feeds remote operations back in.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | The [`engine::Whiteboard`] document: gestures, replay, undo/redo |
//! | [`render`] | Software raster and primitive rasterization |
//! | [`history`] | Linear undo/redo stacks |
//! | [`input`] | Tool selection and the gesture state machine |
//! | [`consts`] | Shared numeric constants (stroke limits, text metrics) |

pub mod consts;
pub mod engine;
pub mod history;
pub mod input;
pub mod render;
