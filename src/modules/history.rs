use std::collections::VecDeque;
use tracing::{debug, trace};

pub const DEFAULT_HISTORY_LIMIT: usize = 30;

#[derive(Debug, Clone)]
struct Entry<T> { label: String, value: T }

/// Linear undo/redo history with a cursor.
///
/// Entry 0 is the state the history was started from. The entry under the
/// cursor is the current state; entries past the cursor can be redone until
/// the next `record`, which prunes them. At most `limit` entries are kept,
/// the oldest ones are dropped first.
#[derive(Debug, Clone)]
pub struct History<T> {
    entries: VecDeque<Entry<T>>,
    cursor: usize,
    limit: usize,
}

impl<T> History<T> {
    pub fn new(initial: T, label: impl Into<String>, limit: usize) -> Self {
        let mut entries: VecDeque<Entry<T>> = VecDeque::new();
        entries.push_back(Entry { label: label.into(), value: initial });
        Self { entries, cursor: 0, limit: limit.max(1) }
    }

    /// Appends `value` after the cursor, dropping any redo entries first.
    pub fn record(&mut self, value: T, label: impl Into<String>) {
        let label: String = label.into();
        let pruned: usize = self.entries.len() - (self.cursor + 1);
        self.entries.truncate(self.cursor + 1);
        self.entries.push_back(Entry { label, value });
        self.cursor = self.entries.len() - 1;
        self.enforce_limit();
        debug!(cursor = self.cursor, len = self.entries.len(), pruned, "history record");
    }

    pub fn undo(&mut self) -> Option<&T> {
        if self.cursor == 0 {
            trace!("nothing to undo");
            return None;
        }
        self.cursor -= 1;
        debug!(cursor = self.cursor, "history undo");
        Some(&self.entries[self.cursor].value)
    }

    pub fn redo(&mut self) -> Option<&T> {
        if self.cursor + 1 >= self.entries.len() {
            trace!("nothing to redo");
            return None;
        }
        self.cursor += 1;
        debug!(cursor = self.cursor, "history redo");
        Some(&self.entries[self.cursor].value)
    }

    pub fn reset(&mut self, initial: T, label: impl Into<String>) {
        self.entries.clear();
        self.entries.push_back(Entry { label: label.into(), value: initial });
        self.cursor = 0;
    }

    pub fn current(&self) -> &T { &self.entries[self.cursor].value }
    pub fn current_label(&self) -> &str { &self.entries[self.cursor].label }

    pub fn can_undo(&self) -> bool { self.cursor > 0 }
    pub fn can_redo(&self) -> bool { self.cursor + 1 < self.entries.len() }

    /// Label of the edit an `undo` would revert.
    pub fn undo_label(&self) -> Option<&str> {
        self.can_undo().then(|| self.entries[self.cursor].label.as_str())
    }

    /// Label of the edit a `redo` would re-apply.
    pub fn redo_label(&self) -> Option<&str> {
        self.entries.get(self.cursor + 1).map(|e| e.label.as_str())
    }

    pub fn undo_depth(&self) -> usize { self.cursor }
    pub fn redo_depth(&self) -> usize { self.entries.len() - self.cursor - 1 }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn cursor(&self) -> usize { self.cursor }
    pub fn limit(&self) -> usize { self.limit }

    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit.max(1);
        self.enforce_limit();
    }

    // Oldest entries go first; the redo tail is only cut once the cursor
    // sits on the oldest entry.
    fn enforce_limit(&mut self) {
        while self.entries.len() > self.limit && self.cursor > 0 {
            self.entries.pop_front();
            self.cursor -= 1;
        }
        if self.entries.len() > self.limit {
            self.entries.truncate(self.limit);
        }
    }
}
