//! Shared numeric constants for the canvas crate.

// ── Stroke ──────────────────────────────────────────────────────

/// Thinnest selectable stroke, in pixels.
pub const MIN_LINE_WIDTH: f64 = 1.0;

/// Thickest selectable stroke, in pixels.
pub const MAX_LINE_WIDTH: f64 = 10.0;

/// Stroke width of a fresh whiteboard.
pub const DEFAULT_LINE_WIDTH: f64 = 4.0;

/// Stroke color of a fresh whiteboard.
pub const DEFAULT_COLOR: &str = "#000000";

// ── Text ────────────────────────────────────────────────────────

/// Font size in pixels per unit of stroke width.
pub const TEXT_SIZE_PER_WIDTH: f64 = 4.0;

/// Horizontal advance of one glyph cell, as a fraction of the font size.
pub const GLYPH_ADVANCE: f64 = 0.6;

/// Height of a glyph block above the baseline, as a fraction of the font size.
pub const GLYPH_ASCENT: f64 = 0.7;
