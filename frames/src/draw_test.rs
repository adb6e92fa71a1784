#![allow(clippy::float_cmp)]

use super::*;

#[test]
fn draw_op_serializes_to_flat_wire_shape() {
    let op = DrawOp::shape(DrawKind::Rectangle, Point::new(1.0, 2.0), Point::new(30.0, 40.0), "#ff0000", 3.0);
    let json = serde_json::to_value(&op).expect("serialize");
    assert_eq!(
        json,
        serde_json::json!({
            "type": "rectangle",
            "x0": 1.0,
            "y0": 2.0,
            "x1": 30.0,
            "y1": 40.0,
            "color": "#ff0000",
            "tool": "rectangle",
            "lineWidth": 3.0
        })
    );
}

#[test]
fn draw_op_deserializes_whiteboard_payload() {
    let op: DrawOp = serde_json::from_value(serde_json::json!({
        "type": "free",
        "x0": 10, "y0": 11, "x1": 12, "y1": 13,
        "color": "#00ff00",
        "tool": "eraser",
        "lineWidth": 6
    }))
    .expect("deserialize");

    assert_eq!(op.kind, DrawKind::Free);
    assert_eq!(op.tool, Tool::Eraser);
    assert_eq!(op.start, Point::new(10.0, 11.0));
    assert_eq!(op.end, Point::new(12.0, 13.0));
    assert_eq!(op.line_width, 6.0);
}

#[test]
fn missing_stroke_fields_fall_back_to_defaults() {
    let op: DrawOp = serde_json::from_value(serde_json::json!({
        "type": "line", "x0": 0, "y0": 0, "x1": 5, "y1": 5
    }))
    .expect("deserialize");
    assert_eq!(op.color, "#000000");
    assert_eq!(op.line_width, 4.0);
    assert_eq!(op.tool, Tool::Pen);
}

#[test]
fn unknown_kind_is_rejected() {
    let result = serde_json::from_value::<DrawOp>(serde_json::json!({
        "type": "triangle", "x0": 0, "y0": 0, "x1": 1, "y1": 1
    }));
    assert!(result.is_err());
}

#[test]
fn eraser_paints_background_color() {
    let op = DrawOp::segment(Point::default(), Point::new(1.0, 1.0), "#123456", 4.0, Tool::Eraser);
    assert_eq!(op.stroke_color(), BACKGROUND_COLOR);

    let pen = DrawOp::segment(Point::default(), Point::new(1.0, 1.0), "#123456", 4.0, Tool::Pen);
    assert_eq!(pen.stroke_color(), "#123456");
}

#[test]
fn circle_radius_is_distance_between_points() {
    let op = DrawOp::shape(DrawKind::Circle, Point::new(0.0, 0.0), Point::new(3.0, 4.0), "#000000", 1.0);
    assert_eq!(op.radius(), 5.0);
}

#[test]
fn text_operations_are_local_only() {
    let text = DrawOp::text(Point::new(5.0, 5.0), "hi", "#000000", 2.0);
    assert!(!text.is_transmittable());
    assert!(DrawOp::shape(DrawKind::Line, Point::default(), Point::default(), "#000", 1.0).is_transmittable());
}

#[test]
fn tool_classification() {
    assert!(Tool::Pen.is_freehand());
    assert!(Tool::Eraser.is_freehand());
    assert!(!Tool::Line.is_freehand());
    assert_eq!(Tool::Circle.shape_kind(), Some(DrawKind::Circle));
    assert_eq!(Tool::Text.shape_kind(), None);
}

#[test]
fn draw_kind_from_wire_matches_serde_names() {
    for kind in [DrawKind::Free, DrawKind::Rectangle, DrawKind::Circle, DrawKind::Line, DrawKind::Text] {
        let name = serde_json::to_value(kind).expect("serialize");
        let name = name.as_str().expect("string");
        assert_eq!(DrawKind::from_wire(name), Some(kind));
    }
    assert_eq!(DrawKind::from_wire("join"), None);
}
