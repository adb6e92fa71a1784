use frames::{DrawOp, Point};

use crate::history::History;
use crate::input::{Gesture, ToolState};
use crate::render::{Raster, Rgb};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    None,
    /// Operation drawn locally that peers should replay.
    Publish(DrawOp),
    /// A gesture finished and was recorded in the undo history.
    Committed,
    /// The text tool was clicked; the host should collect text for this point.
    TextRequested(Point),
}

/// Canvas pixels plus the operations that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub raster: Raster,
    pub ops: Vec<DrawOp>,
}

/// One peer's whiteboard: local gestures, remote replay, and undo/redo.
///
/// Undo and redo restore whole-canvas snapshots and are never broadcast, so
/// after an undo the local canvas may differ from peers'.
pub struct Whiteboard {
    scene: Scene,
    history: History<Scene>,
    tools: ToolState,
    gesture: Gesture,
    /// Scene captured at pointer-down, recorded when the gesture commits.
    before: Option<Scene>,
}

impl Whiteboard {
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            scene: Scene { raster: Raster::new(width, height), ops: Vec::new() },
            history: History::new(),
            tools: ToolState::default(),
            gesture: Gesture::Idle,
            before: None,
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn raster(&self) -> &Raster {
        &self.scene.raster
    }

    /// Operations painted since the last clear, in application order.
    #[must_use]
    pub fn ops(&self) -> &[DrawOp] {
        &self.scene.ops
    }

    #[must_use]
    pub fn tools(&self) -> &ToolState {
        &self.tools
    }

    #[must_use]
    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.history.redo_depth()
    }

    // --- Tool settings ---

    pub fn set_tool(&mut self, tool: frames::Tool) {
        self.tools.tool = tool;
    }

    pub fn set_color(&mut self, color: &str) {
        color.clone_into(&mut self.tools.color);
    }

    pub fn set_line_width(&mut self, width: f64) {
        self.tools.set_line_width(width);
    }

    // --- Pointer input ---

    /// Begin a gesture with the active tool.
    pub fn pointer_down(&mut self, at: Point) -> Action {
        if self.gesture.is_dragging() {
            return Action::None;
        }
        let tool = self.tools.tool;
        if tool.is_freehand() {
            self.before = Some(self.scene.clone());
            self.gesture = Gesture::Stroke { last: at };
            return Action::None;
        }
        if let Some(kind) = tool.shape_kind() {
            self.before = Some(self.scene.clone());
            self.gesture = Gesture::Shape { kind, start: at };
            return Action::None;
        }
        self.gesture = Gesture::TextPlacement { at };
        Action::TextRequested(at)
    }

    /// Continue a freehand stroke. Each move draws and publishes one segment.
    pub fn pointer_move(&mut self, at: Point) -> Action {
        let Gesture::Stroke { last } = self.gesture else {
            return Action::None;
        };
        let op = DrawOp::segment(last, at, &self.tools.color, self.tools.line_width(), self.tools.tool);
        self.paint(&op);
        self.gesture = Gesture::Stroke { last: at };
        Action::Publish(op)
    }

    /// Finish the gesture. Shapes are drawn and published now; strokes were
    /// already published and are only committed to history.
    pub fn pointer_up(&mut self, at: Point) -> Action {
        match self.gesture {
            Gesture::Stroke { .. } => {
                self.gesture = Gesture::Idle;
                self.commit();
                Action::Committed
            }
            Gesture::Shape { kind, start } => {
                self.gesture = Gesture::Idle;
                let op = DrawOp::shape(kind, start, at, &self.tools.color, self.tools.line_width());
                self.paint(&op);
                self.commit();
                Action::Publish(op)
            }
            Gesture::Idle | Gesture::TextPlacement { .. } => Action::None,
        }
    }

    /// Pointer left the canvas: ends the gesture exactly like a release.
    pub fn pointer_leave(&mut self, at: Point) -> Action {
        self.pointer_up(at)
    }

    // --- Text ---

    /// Render text at the pending placement. Text stays local and is captured
    /// only by snapshots. Blank input places nothing.
    pub fn submit_text(&mut self, text: &str) -> Action {
        let Gesture::TextPlacement { at } = self.gesture else {
            return Action::None;
        };
        self.gesture = Gesture::Idle;
        if text.trim().is_empty() {
            return Action::None;
        }
        let before = self.scene.clone();
        let op = DrawOp::text(at, text, &self.tools.color, self.tools.line_width());
        self.paint(&op);
        self.history.record(before);
        Action::Committed
    }

    /// Drop a pending text placement without drawing.
    pub fn cancel_text(&mut self) {
        if matches!(self.gesture, Gesture::TextPlacement { .. }) {
            self.gesture = Gesture::Idle;
        }
    }

    // --- Whole-canvas actions ---

    /// Reset to the background color. Local only; recorded in history.
    pub fn clear(&mut self) -> Action {
        self.settle_gesture();
        let before = self.scene.clone();
        self.scene.raster.fill(Rgb::WHITE);
        self.scene.ops.clear();
        self.history.record(before);
        Action::Committed
    }

    /// Replay an operation received from a peer. Text is never replayed.
    /// Remote operations are not recorded in the local undo history.
    pub fn apply_remote(&mut self, op: &DrawOp) -> bool {
        if !op.is_transmittable() {
            return false;
        }
        self.paint(op);
        true
    }

    /// Restore the snapshot before the last completed action.
    pub fn undo(&mut self) -> bool {
        self.settle_gesture();
        self.history.undo(&mut self.scene)
    }

    /// Re-apply the last undone action.
    pub fn redo(&mut self) -> bool {
        self.settle_gesture();
        self.history.redo(&mut self.scene)
    }

    // --- Internals ---

    fn paint(&mut self, op: &DrawOp) {
        self.scene.raster.draw(op);
        self.scene.ops.push(op.clone());
    }

    fn commit(&mut self) {
        if let Some(before) = self.before.take() {
            self.history.record(before);
        }
    }

    /// An in-progress drag is committed as-is before a whole-canvas action,
    /// so segments already published stay undoable.
    fn settle_gesture(&mut self) {
        if self.gesture.is_dragging() {
            self.commit();
        }
        self.gesture = Gesture::Idle;
    }
}
