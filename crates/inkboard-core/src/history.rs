//! Undo/redo over scene snapshots.

use crate::scene::Scene;
use std::collections::VecDeque;

/// Default maximum number of undo states to keep.
pub const DEFAULT_MAX_HISTORY: usize = 100;

/// Two bounded stacks of scene snapshots.
///
/// Only scenes are recorded. Viewport, selection, clipboard and the active
/// tool are untouched by undo and redo.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: VecDeque<Scene>,
    redo_stack: VecDeque<Scene>,
    max_depth: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl History {
    /// Create an empty history. A depth of zero records nothing.
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_depth,
        }
    }

    /// Record the scene as it was before a change. Clears the redo stack.
    pub fn push(&mut self, scene: Scene) {
        self.redo_stack.clear();
        Self::push_bounded(&mut self.undo_stack, scene, self.max_depth);
    }

    fn push_bounded(stack: &mut VecDeque<Scene>, scene: Scene, max_depth: usize) {
        if max_depth == 0 {
            return;
        }
        stack.push_back(scene);
        while stack.len() > max_depth {
            stack.pop_front();
        }
    }

    /// Step back. `current` moves to the redo stack and the most recent
    /// snapshot is returned; `None` if there is nothing to undo.
    pub fn undo(&mut self, current: Scene) -> Option<Scene> {
        let previous = self.undo_stack.pop_back()?;
        Self::push_bounded(&mut self.redo_stack, current, self.max_depth);
        Some(previous)
    }

    /// Mirror of [`History::undo`].
    pub fn redo(&mut self, current: Scene) -> Option<Scene> {
        let next = self.redo_stack.pop_back()?;
        Self::push_bounded(&mut self.undo_stack, current, self.max_depth);
        Some(next)
    }

    /// Drop the most recent snapshot without moving anything to redo, e.g.
    /// when the gesture it was recorded for is cancelled.
    pub fn discard_last(&mut self) -> Option<Scene> {
        self.undo_stack.pop_back()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
