#![allow(clippy::float_cmp)]

use super::*;

#[test]
fn default_tool_state_is_black_pen() {
    let tools = ToolState::default();
    assert_eq!(tools.tool, Tool::Pen);
    assert_eq!(tools.color, "#000000");
    assert_eq!(tools.line_width(), 4.0);
}

#[test]
fn line_width_is_clamped_to_range() {
    let mut tools = ToolState::default();
    tools.set_line_width(25.0);
    assert_eq!(tools.line_width(), 10.0);
    tools.set_line_width(0.0);
    assert_eq!(tools.line_width(), 1.0);
    tools.set_line_width(7.0);
    assert_eq!(tools.line_width(), 7.0);
}

#[test]
fn non_finite_line_width_is_ignored() {
    let mut tools = ToolState::default();
    tools.set_line_width(f64::NAN);
    assert_eq!(tools.line_width(), 4.0);
}

#[test]
fn only_strokes_and_shapes_are_drags() {
    assert!(!Gesture::Idle.is_dragging());
    assert!(Gesture::Stroke { last: Point::default() }.is_dragging());
    assert!(Gesture::Shape { kind: DrawKind::Line, start: Point::default() }.is_dragging());
    assert!(!Gesture::TextPlacement { at: Point::default() }.is_dragging());
}
