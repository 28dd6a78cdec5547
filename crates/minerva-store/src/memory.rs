//! In-memory row source with the remote store's partial-update semantics.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use minerva_core::{Filter, Record, RowUpdate, Snapshot};

use crate::{RowSource, StoreError};

#[derive(Debug, Default)]
struct State {
    rows: Vec<Record>,
    fetches: u64,
    saves: Vec<(i64, RowUpdate)>,
    fetch_error: Option<String>,
    reject_saves: bool,
}

/// A sheet held in memory. Writes merge only the supplied columns.
#[derive(Debug, Default)]
pub struct MemorySheet {
    state: Mutex<State>,
}

impl MemorySheet {
    pub fn new(rows: Vec<Record>) -> Self {
        Self {
            state: Mutex::new(State {
                rows,
                ..State::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make every following fetch fail with `message`.
    pub fn fail_fetches(&self, message: &str) {
        self.state().fetch_error = Some(message.to_string());
    }

    /// Make every following save return `false`.
    pub fn reject_saves(&self, reject: bool) {
        self.state().reject_saves = reject;
    }

    pub fn fetch_count(&self) -> u64 {
        self.state().fetches
    }

    /// Successful saves, in order.
    pub fn saves(&self) -> Vec<(i64, RowUpdate)> {
        self.state().saves.clone()
    }

    pub fn row(&self, row_id: i64) -> Option<Record> {
        self.state().rows.iter().find(|r| r.row_id == row_id).cloned()
    }
}

#[async_trait]
impl RowSource for MemorySheet {
    async fn fetch(&self, filter: Filter) -> Result<Snapshot, StoreError> {
        let mut state = self.state();
        state.fetches += 1;
        if let Some(message) = &state.fetch_error {
            return Err(StoreError::Remote(message.clone()));
        }
        Ok(Snapshot::from_records(state.rows.clone(), filter))
    }

    async fn save(&self, row_id: i64, update: &RowUpdate) -> bool {
        let mut state = self.state();
        if state.reject_saves {
            return false;
        }
        let Some(row) = state.rows.iter_mut().find(|r| r.row_id == row_id) else {
            return false;
        };
        for (column, value) in update.iter() {
            row.apply_field(column, value);
        }
        state.saves.push((row_id, update.clone()));
        true
    }
}
