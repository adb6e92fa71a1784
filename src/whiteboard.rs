//! Whiteboard as a shared document: local gestures publish drawing
//! operations, remote operations are replayed onto the raster.

use canvas::engine::{Action, Whiteboard};
use frames::{Body, Envelope, Point, Tool};

use crate::sync::SharedDocument;

/// One local whiteboard input event.
#[derive(Debug, Clone, PartialEq)]
pub enum WhiteboardEdit {
    PointerDown(Point),
    PointerMove(Point),
    PointerUp(Point),
    PointerLeave(Point),
    SubmitText(String),
    CancelText,
    Clear,
    Undo,
    Redo,
    SetTool(Tool),
    SetColor(String),
    SetLineWidth(f64),
}

impl SharedDocument for Whiteboard {
    type Edit = WhiteboardEdit;

    fn apply_local(&mut self, edit: WhiteboardEdit) -> Option<Body> {
        let action = match edit {
            WhiteboardEdit::PointerDown(at) => self.pointer_down(at),
            WhiteboardEdit::PointerMove(at) => self.pointer_move(at),
            WhiteboardEdit::PointerUp(at) => self.pointer_up(at),
            WhiteboardEdit::PointerLeave(at) => self.pointer_leave(at),
            WhiteboardEdit::SubmitText(text) => self.submit_text(&text),
            WhiteboardEdit::Clear => self.clear(),
            WhiteboardEdit::CancelText => {
                self.cancel_text();
                Action::None
            }
            WhiteboardEdit::Undo => {
                self.undo();
                Action::None
            }
            WhiteboardEdit::Redo => {
                self.redo();
                Action::None
            }
            WhiteboardEdit::SetTool(tool) => {
                self.set_tool(tool);
                Action::None
            }
            WhiteboardEdit::SetColor(color) => {
                self.set_color(&color);
                Action::None
            }
            WhiteboardEdit::SetLineWidth(width) => {
                self.set_line_width(width);
                Action::None
            }
        };
        match action {
            Action::Publish(op) => Some(Body::Draw(op)),
            Action::None | Action::Committed | Action::TextRequested(_) => None,
        }
    }

    fn apply_remote(&mut self, envelope: &Envelope) -> bool {
        match &envelope.body {
            Body::Draw(op) => Whiteboard::apply_remote(self, op),
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "whiteboard_test.rs"]
mod tests;
