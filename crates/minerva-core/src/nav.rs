//! Cursor over the current snapshot.

use thiserror::Error;

use crate::record::Record;
use crate::snapshot::Snapshot;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavError {
    #[error("index {index} is out of range for {len} rows")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("row {0} is not in the current view")]
    NotFound(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Prev,
}

/// Outcome of re-anchoring the cursor after a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reanchor {
    /// The previous row is still present; the cursor follows it.
    Kept,
    /// The previous row is gone (or there was none); the cursor is at index 0.
    Reset,
}

/// Position in a snapshot.
///
/// `0 <= cursor < len` whenever the snapshot is non-empty. Failed moves
/// leave the cursor untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Navigator {
    cursor: usize,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current<'a>(&self, snapshot: &'a Snapshot) -> Option<&'a Record> {
        snapshot.get(self.cursor)
    }

    pub fn goto_index(&mut self, index: usize, snapshot: &Snapshot) -> Result<(), NavError> {
        if index >= snapshot.len() {
            return Err(NavError::IndexOutOfRange {
                index,
                len: snapshot.len(),
            });
        }
        self.cursor = index;
        Ok(())
    }

    pub fn goto_row_id(&mut self, row_id: i64, snapshot: &Snapshot) -> Result<(), NavError> {
        let index = snapshot
            .position_of(row_id)
            .ok_or(NavError::NotFound(row_id))?;
        self.cursor = index;
        Ok(())
    }

    /// Step one row, clamped at both ends. Returns whether the cursor moved.
    pub fn advance(&mut self, direction: Direction, snapshot: &Snapshot) -> bool {
        let last = match snapshot.len() {
            0 => return false,
            n => n - 1,
        };
        let next = match direction {
            Direction::Next if self.cursor < last => self.cursor + 1,
            Direction::Prev if self.cursor > 0 => self.cursor.min(last).saturating_sub(1),
            _ => return false,
        };
        self.cursor = next;
        true
    }

    /// Follow `row_id` into a freshly fetched snapshot, falling back to index 0.
    pub fn reanchor(&mut self, row_id: Option<i64>, snapshot: &Snapshot) -> Reanchor {
        if let Some(id) = row_id
            && self.goto_row_id(id, snapshot).is_ok()
        {
            return Reanchor::Kept;
        }
        self.cursor = 0;
        Reanchor::Reset
    }
}
