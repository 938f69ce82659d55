//! # Undo/Redo History
//!
//! Linear history over immutable snapshots.
//!
//! ## Design
//!
//! - Each commit records the snapshot and selection before and after it
//! - Undo restores the "before" pair and moves the entry to the redo stack
//! - Redo restores the "after" pair
//! - A new commit clears the redo stack
//! - Snapshots share unchanged nodes, so an entry costs only what its commit touched
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut history = History::new();
//! history.push(entry);
//!
//! if let Some((snapshot, selection)) = history.undo() {
//!     // install both together
//! }
//! ```

use crate::selection::Selection;
use folio_document::Snapshot;

/// One committed transaction
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub before: Snapshot,
    pub after: Snapshot,
    pub selection_before: Selection,
    pub selection_after: Selection,

    /// Optional description of this edit
    pub description: Option<String>,
}

/// Undo/redo stack for an editor session
#[derive(Debug)]
pub struct History {
    /// Applied entries (most recent last)
    undo_stack: Vec<HistoryEntry>,

    /// Undone entries (most recent last)
    redo_stack: Vec<HistoryEntry>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,
}

impl History {
    /// Create a history with default max levels (100)
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
        }
    }

    /// Record a commit
    pub fn push(&mut self, entry: HistoryEntry) {
        self.undo_stack.push(entry);

        // Trim if exceeded max levels
        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }

        // New edit invalidates the redo tail
        self.redo_stack.clear();
    }

    /// Step back; `None` at the bottom of the stack
    pub fn undo(&mut self) -> Option<(Snapshot, Selection)> {
        let entry = self.undo_stack.pop()?;
        let restored = (entry.before.clone(), entry.selection_before.clone());
        self.redo_stack.push(entry);
        Some(restored)
    }

    /// Step forward; `None` at the top of the stack
    pub fn redo(&mut self) -> Option<(Snapshot, Selection)> {
        let entry = self.redo_stack.pop()?;
        let restored = (entry.after.clone(), entry.selection_after.clone());
        self.undo_stack.push(entry);
        Some(restored)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_levels(&self) -> usize {
        self.max_levels
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Get description of the next undo operation
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack
            .last()
            .and_then(|entry| entry.description.as_deref())
    }

    /// Get description of the next redo operation
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack
            .last()
            .and_then(|entry| entry.description.as_deref())
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
