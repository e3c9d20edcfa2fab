use std::collections::VecDeque;

use crate::visualize::Change;

/// Applied frame changes, kept so a paused animation can be stepped back and forth.
pub struct StepHistory {
    /// History of changes, with the most recent change at the front.
    changes: VecDeque<Change>,
    /// Number of changes currently undone. 0 means the frame shows the latest state.
    /// Always between 0 and changes.len().
    cursor: usize,
    /// Maximum number of changes to keep. If 0, no history is kept.
    max_len: usize,
}

impl StepHistory {
    pub fn new(max_len: usize) -> Self {
        StepHistory {
            changes: VecDeque::with_capacity(max_len),
            cursor: 0,
            max_len,
        }
    }

    /// Records a freshly applied change. Undone changes are discarded first.
    pub fn record(&mut self, change: Change) {
        if self.max_len == 0 {
            return;
        }
        self.changes.drain(..self.cursor);
        self.cursor = 0;
        // Remove oldest changes if we exceed max history size
        self.changes.truncate(self.max_len - 1);
        self.changes.push_front(change);
    }

    /// Steps one change back. Returns the change that reverts it.
    pub fn undo(&mut self) -> Option<Change> {
        let change = self.changes.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(change.reverted())
    }

    /// Steps one change forward again. Returns the change to re-apply.
    pub fn redo(&mut self) -> Option<Change> {
        match self.cursor {
            0 => None, // Already at the most recent change
            _ => {
                self.cursor -= 1;
                self.changes.get(self.cursor).copied()
            }
        }
    }

    /// Whether some changes are currently undone.
    pub fn is_rewound(&self) -> bool {
        self.cursor > 0
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.changes.len()
    }
}
