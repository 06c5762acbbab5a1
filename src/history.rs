//! Undo/redo history over whole-state snapshots.
//!
//! The history holds a `past` stack (oldest first), the live `present` value,
//! and a `future` queue (nearest undone first). Every change is recorded by
//! committing a complete new value, so undo and redo never need to know what
//! kind of mutation produced it.

use std::collections::VecDeque;

/// Configuration for the history.
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryConfig {
    /// Maximum number of past entries to keep. `None` keeps everything.
    pub max_history: Option<usize>,
}

/// Past / present / future triple implementing undo and redo.
#[derive(Debug, Clone)]
pub struct History<T: Clone> {
    /// States that can be undone to (most recent at the end)
    past: Vec<T>,
    /// The live state
    present: T,
    /// States that can be redone to (next one at the front)
    future: VecDeque<T>,
    config: HistoryConfig,
}

impl<T: Clone + Default> Default for History<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone> History<T> {
    /// Create a history whose present is `initial` and with nothing to undo.
    pub fn new(initial: T) -> Self {
        Self::with_config(initial, HistoryConfig::default())
    }

    /// Create with custom configuration
    pub fn with_config(initial: T, config: HistoryConfig) -> Self {
        Self {
            past: Vec::new(),
            present: initial,
            future: VecDeque::new(),
            config,
        }
    }

    pub fn present(&self) -> &T {
        &self.present
    }

    /// Make `next` the present, pushing the old present onto the past.
    ///
    /// A new commit invalidates everything that could have been redone.
    pub fn commit(&mut self, next: T) {
        let previous = std::mem::replace(&mut self.present, next);
        self.past.push(previous);
        self.future.clear();

        if let Some(limit) = self.config.max_history {
            let excess = self.past.len().saturating_sub(limit);
            if excess > 0 {
                self.past.drain(..excess);
            }
        }
    }

    /// Step back one entry. Returns `false` (and changes nothing) if there is
    /// nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.past.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.present, previous);
        self.future.push_front(current);
        true
    }

    /// Step forward one entry. Returns `false` (and changes nothing) if there
    /// is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.future.pop_front() else {
            return false;
        };
        let current = std::mem::replace(&mut self.present, next);
        self.past.push(current);
        true
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Get number of undo steps available
    pub fn undo_count(&self) -> usize {
        self.past.len()
    }

    /// Get number of redo steps available
    pub fn redo_count(&self) -> usize {
        self.future.len()
    }
}
