//! Bounded undo/redo snapshot stacks.
//!
//! Each committed change pushes a deep-copied DTO array. Undo pops the
//! current state onto the redo stack and hands back the state beneath it;
//! redo reverses the move. The stacks never exceed `max_depth`: the
//! oldest snapshot is evicted from the front. A re-entrancy guard marks
//! the window in which a history snapshot is being applied, so the change
//! notification it produces cannot itself push a new commit.

use log::debug;
use pm_core::dto::PatchDto;

/// One history entry: the full patch state after a commit.
pub type Snapshot = Vec<PatchDto>;

#[derive(Debug, Default)]
pub struct HistoryStack {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    max_depth: usize,
    /// Set while an undo/redo snapshot is being applied.
    applying: bool,
}

impl HistoryStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth),
            redo_stack: Vec::new(),
            max_depth,
            applying: false,
        }
    }

    /// Push a committed state. Ignored while a history snapshot is being
    /// applied (re-entrancy guard). Clears the redo stack.
    pub fn commit(&mut self, snapshot: Snapshot) {
        if self.applying {
            debug!("commit ignored: applying history snapshot");
            return;
        }
        self.undo_stack.push(snapshot);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    /// Step back: the most recent commit moves to the redo stack and the
    /// state beneath it is returned for application. An empty stack
    /// returns `None`. The state before the first retained commit is the
    /// empty scene.
    pub fn undo(&mut self) -> Option<Snapshot> {
        let current = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        Some(self.undo_stack.last().cloned().unwrap_or_default())
    }

    /// Step forward: re-apply the most recently undone commit.
    pub fn redo(&mut self) -> Option<Snapshot> {
        let snapshot = self.redo_stack.pop()?;
        self.undo_stack.push(snapshot.clone());
        Some(snapshot)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.undo_stack.len()
    }

    // ── Re-entrancy guard ──

    pub fn begin_apply(&mut self) {
        self.applying = true;
    }

    pub fn end_apply(&mut self) {
        self.applying = false;
    }

    pub fn is_applying(&self) -> bool {
        self.applying
    }
}
