//! Input model: the active tool settings and the gesture state machine.
//!
//! `ToolState` captures what a pointer gesture will draw with. `Gesture` is the
//! interaction tracked between pointer-down and pointer-up, carrying what the
//! engine needs to emit segments while dragging or one shape on release.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use frames::{DrawKind, Point, Tool};

use crate::consts::{DEFAULT_COLOR, DEFAULT_LINE_WIDTH, MAX_LINE_WIDTH, MIN_LINE_WIDTH};

/// Stroke settings applied to the next gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolState {
    pub tool: Tool,
    /// CSS hex color.
    pub color: String,
    /// Stroke width in pixels, always within the selectable range.
    line_width: f64,
}

impl Default for ToolState {
    fn default() -> Self {
        Self { tool: Tool::Pen, color: DEFAULT_COLOR.to_owned(), line_width: DEFAULT_LINE_WIDTH }
    }
}

impl ToolState {
    #[must_use]
    pub fn line_width(&self) -> f64 {
        self.line_width
    }

    /// Set the stroke width, clamped to the selectable range. Non-finite
    /// widths leave the current width unchanged.
    pub fn set_line_width(&mut self, width: f64) {
        if width.is_finite() {
            self.line_width = width.clamp(MIN_LINE_WIDTH, MAX_LINE_WIDTH);
        }
    }
}

/// The gesture in progress.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Gesture {
    /// No gesture active.
    #[default]
    Idle,
    /// Pen or eraser drag; `last` is where the previous segment ended.
    Stroke { last: Point },
    /// Rectangle, circle, or line drag anchored at `start`.
    Shape { kind: DrawKind, start: Point },
    /// Text tool clicked at `at`, waiting for the text to be entered.
    TextPlacement { at: Point },
}

impl Gesture {
    /// Whether a drag is in progress (text placement is not a drag).
    #[must_use]
    pub fn is_dragging(self) -> bool {
        matches!(self, Self::Stroke { .. } | Self::Shape { .. })
    }
}
