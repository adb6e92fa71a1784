//! Linear undo/redo stacks.
//!
//! The history stores whole states rather than inverse operations. Recording a
//! new action clears the redo stack, so the history never branches.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

/// Past and future states around the current one.
#[derive(Clone, Debug)]
pub struct History<T> {
    past: Vec<T>,
    future: Vec<T>,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self { past: Vec::new(), future: Vec::new() }
    }
}

impl<T> History<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the state as it was before a completed action.
    pub fn record(&mut self, before: T) {
        self.past.push(before);
        self.future.clear();
    }

    /// Step back one action, swapping `current` with the previous state.
    /// Returns `false` when there is nothing to undo.
    pub fn undo(&mut self, current: &mut T) -> bool {
        let Some(previous) = self.past.pop() else {
            return false;
        };
        self.future.push(std::mem::replace(current, previous));
        true
    }

    /// Step forward one undone action. Returns `false` when the redo stack is
    /// empty.
    pub fn redo(&mut self, current: &mut T) -> bool {
        let Some(next) = self.future.pop() else {
            return false;
        };
        self.past.push(std::mem::replace(current, next));
        true
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}
