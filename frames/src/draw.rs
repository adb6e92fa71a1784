//! Drawing operations exchanged between whiteboard peers.
//!
//! Every remote-replayable primitive is described by two points plus stroke
//! parameters. The wire form keeps the flat shape whiteboard clients already
//! publish: `{type, x0, y0, x1, y1, color, tool, lineWidth}`.

use serde::{Deserialize, Serialize};

/// Background color of a fresh whiteboard. The eraser paints with it.
pub const BACKGROUND_COLOR: &str = "#FFFFFF";

/// A point in canvas pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Primitive kind of a drawing operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawKind {
    /// Two-point freehand segment.
    Free,
    /// Axis-aligned rectangle outline spanned by the two points.
    Rectangle,
    /// Circle outline centered on the start point through the end point.
    Circle,
    /// Straight line between the two points.
    Line,
    /// Text anchored at the start point. Never transmitted.
    Text,
}

impl DrawKind {
    /// Parse a wire `type` value into a kind.
    #[must_use]
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw {
            "free" => Some(Self::Free),
            "rectangle" => Some(Self::Rectangle),
            "circle" => Some(Self::Circle),
            "line" => Some(Self::Line),
            "text" => Some(Self::Text),
            _ => None,
        }
    }
}

/// Whiteboard tool that produced an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Pen,
    Eraser,
    Text,
    Rectangle,
    Circle,
    Line,
}

impl Tool {
    /// Tools that emit a segment on every pointer move.
    #[must_use]
    pub fn is_freehand(self) -> bool {
        matches!(self, Self::Pen | Self::Eraser)
    }

    /// Tools that emit one operation when the pointer is released.
    #[must_use]
    pub fn shape_kind(self) -> Option<DrawKind> {
        match self {
            Self::Rectangle => Some(DrawKind::Rectangle),
            Self::Circle => Some(DrawKind::Circle),
            Self::Line => Some(DrawKind::Line),
            Self::Pen | Self::Eraser | Self::Text => None,
        }
    }
}

/// One drawing primitive with its stroke parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireDrawOp", into = "WireDrawOp")]
pub struct DrawOp {
    pub kind: DrawKind,
    pub start: Point,
    /// End point; for circles the radius is the distance from `start`.
    pub end: Point,
    /// CSS hex color, e.g. `"#1F1A17"`.
    pub color: String,
    /// Stroke width in pixels. Text size is derived from it.
    pub line_width: f64,
    pub tool: Tool,
    /// Text content for [`DrawKind::Text`].
    pub text: Option<String>,
}

impl DrawOp {
    /// Freehand segment from the pen or eraser.
    #[must_use]
    pub fn segment(start: Point, end: Point, color: &str, line_width: f64, tool: Tool) -> Self {
        Self { kind: DrawKind::Free, start, end, color: color.to_owned(), line_width, tool, text: None }
    }

    /// Rectangle, circle, or line spanned by two points.
    #[must_use]
    pub fn shape(kind: DrawKind, start: Point, end: Point, color: &str, line_width: f64) -> Self {
        let tool = match kind {
            DrawKind::Rectangle => Tool::Rectangle,
            DrawKind::Circle => Tool::Circle,
            DrawKind::Line => Tool::Line,
            DrawKind::Free => Tool::Pen,
            DrawKind::Text => Tool::Text,
        };
        Self { kind, start, end, color: color.to_owned(), line_width, tool, text: None }
    }

    /// Text anchored on its baseline at `at`.
    #[must_use]
    pub fn text(at: Point, text: &str, color: &str, line_width: f64) -> Self {
        Self {
            kind: DrawKind::Text,
            start: at,
            end: at,
            color: color.to_owned(),
            line_width,
            tool: Tool::Text,
            text: Some(text.to_owned()),
        }
    }

    /// Text is rendered locally and captured only by snapshots.
    #[must_use]
    pub fn is_transmittable(&self) -> bool {
        self.kind != DrawKind::Text
    }

    /// Color actually painted: the eraser always paints the background.
    #[must_use]
    pub fn stroke_color(&self) -> &str {
        if self.tool == Tool::Eraser { BACKGROUND_COLOR } else { &self.color }
    }

    /// Circle radius derived from the two points.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.start.distance(self.end)
    }
}

#[derive(Clone, Serialize, Deserialize)]
struct WireDrawOp {
    #[serde(rename = "type")]
    kind: DrawKind,
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    #[serde(default = "default_color")]
    color: String,
    #[serde(default)]
    tool: Tool,
    #[serde(rename = "lineWidth", default = "default_line_width")]
    line_width: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

fn default_color() -> String {
    "#000000".to_owned()
}

fn default_line_width() -> f64 {
    4.0
}

impl From<WireDrawOp> for DrawOp {
    fn from(wire: WireDrawOp) -> Self {
        Self {
            kind: wire.kind,
            start: Point::new(wire.x0, wire.y0),
            end: Point::new(wire.x1, wire.y1),
            color: wire.color,
            line_width: wire.line_width,
            tool: wire.tool,
            text: wire.text,
        }
    }
}

impl From<DrawOp> for WireDrawOp {
    fn from(op: DrawOp) -> Self {
        Self {
            kind: op.kind,
            x0: op.start.x,
            y0: op.start.y,
            x1: op.end.x,
            y1: op.end.y,
            color: op.color,
            tool: op.tool,
            line_width: op.line_width,
            text: op.text,
        }
    }
}

#[cfg(test)]
#[path = "draw_test.rs"]
mod tests;
