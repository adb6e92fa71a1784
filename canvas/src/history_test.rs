use super::*;

#[test]
fn empty_history_cannot_undo_or_redo() {
    let mut history = History::<u32>::new();
    let mut current = 0;
    assert!(!history.undo(&mut current));
    assert!(!history.redo(&mut current));
    assert_eq!(current, 0);
}

#[test]
fn undo_restores_recorded_state_and_redo_returns() {
    let mut history = History::new();
    let mut current = 1;
    history.record(current);
    current = 2;

    assert!(history.undo(&mut current));
    assert_eq!(current, 1);
    assert!(history.can_redo());

    assert!(history.redo(&mut current));
    assert_eq!(current, 2);
    assert!(!history.can_redo());
}

#[test]
fn recording_after_undo_discards_redo_stack() {
    let mut history = History::new();
    let mut current = "a";
    history.record(current);
    current = "ab";
    history.record(current);
    current = "abc";

    assert!(history.undo(&mut current));
    assert_eq!(history.redo_depth(), 1);

    history.record(current);
    current = "abd";
    assert_eq!(history.redo_depth(), 0);
    assert!(!history.redo(&mut current));
    assert_eq!(current, "abd");
    assert_eq!(history.undo_depth(), 2);
}

#[test]
fn clear_empties_both_stacks() {
    let mut history = History::new();
    let mut current = 0;
    history.record(current);
    current = 1;
    assert!(history.undo(&mut current));
    history.record(current);
    history.clear();
    assert!(!history.can_undo());
    assert!(!history.can_redo());
}
