use canvas::render::Rgb;
use frames::DrawKind;

use super::*;

fn drag(board: &mut Whiteboard, from: (f64, f64), to: (f64, f64)) -> Vec<Body> {
    [
        WhiteboardEdit::PointerDown(Point::new(from.0, from.1)),
        WhiteboardEdit::PointerMove(Point::new(to.0, to.1)),
        WhiteboardEdit::PointerUp(Point::new(to.0, to.1)),
    ]
    .into_iter()
    .filter_map(|edit| board.apply_local(edit))
    .collect()
}

#[test]
fn pen_stroke_publishes_one_segment_per_move() {
    let mut board = Whiteboard::new(50, 50);
    let bodies = drag(&mut board, (5.0, 5.0), (40.0, 40.0));
    assert_eq!(bodies.len(), 1);
    let Body::Draw(op) = &bodies[0] else {
        panic!("expected draw body");
    };
    assert_eq!(op.kind, DrawKind::Free);
    assert!(board.can_undo());
}

#[test]
fn shape_publishes_on_release() {
    let mut board = Whiteboard::new(50, 50);
    board.apply_local(WhiteboardEdit::SetTool(Tool::Rectangle));
    let bodies = drag(&mut board, (5.0, 5.0), (40.0, 40.0));
    assert!(matches!(bodies.as_slice(), [Body::Draw(op)] if op.kind == DrawKind::Rectangle));
}

#[test]
fn text_clear_and_history_publish_nothing() {
    let mut board = Whiteboard::new(80, 80);
    board.apply_local(WhiteboardEdit::SetTool(Tool::Text));
    assert_eq!(board.apply_local(WhiteboardEdit::PointerDown(Point::new(10.0, 40.0))), None);
    assert_eq!(board.apply_local(WhiteboardEdit::SubmitText("hi".to_owned())), None);
    assert!(!board.raster().is_blank());

    assert_eq!(board.apply_local(WhiteboardEdit::Undo), None);
    assert!(board.raster().is_blank());
    assert_eq!(board.apply_local(WhiteboardEdit::Redo), None);
    assert_eq!(board.apply_local(WhiteboardEdit::Clear), None);
    assert!(board.raster().is_blank());
}

#[test]
fn remote_draw_replays_and_other_bodies_are_ignored() {
    let mut local = Whiteboard::new(50, 50);
    let bodies = drag(&mut local, (5.0, 25.0), (45.0, 25.0));
    let Some(Body::Draw(op)) = bodies.into_iter().next() else {
        panic!("expected draw body");
    };

    let mut peer = Whiteboard::new(50, 50);
    assert!(SharedDocument::apply_remote(&mut peer, &Envelope::draw("alice", op)));
    assert!(!SharedDocument::apply_remote(&mut peer, &Envelope::chat("alice", "hi")));
    assert_eq!(peer.raster(), local.raster());
    assert!(peer.raster().count(Rgb::BLACK) > 0);
}

#[test]
fn tool_settings_apply_to_published_ops() {
    let mut board = Whiteboard::new(50, 50);
    board.apply_local(WhiteboardEdit::SetColor("#ff0000".to_owned()));
    board.apply_local(WhiteboardEdit::SetLineWidth(25.0));
    let bodies = drag(&mut board, (5.0, 5.0), (20.0, 20.0));
    let Some(Body::Draw(op)) = bodies.first() else {
        panic!("expected draw body");
    };
    assert_eq!(op.color, "#ff0000");
    assert!((op.line_width - 10.0).abs() < f64::EPSILON);
}
