//! Memoised snapshots of the remote sheet.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use async_trait::async_trait;
use minerva_core::{Filter, RowUpdate, Snapshot};
use tracing::debug;

use crate::StoreError;

/// The remote row store as seen by the cache and the review session.
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Read every row, normalised, filtered and sorted into a snapshot.
    async fn fetch(&self, filter: Filter) -> Result<Snapshot, StoreError>;

    /// Apply a partial update to one row. `false` means "not saved"; callers
    /// may retry.
    async fn save(&self, row_id: i64, update: &RowUpdate) -> bool;
}

/// Last fetched snapshot per filter.
///
/// Entries are only ever replaced wholesale. After a successful write the
/// caller must [`invalidate`](Self::invalidate) before the next read.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    entries: HashMap<Filter, Snapshot>,
    fetches: u64,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve the cached snapshot for `filter`, fetching it on a miss.
    pub async fn get_or_fetch<S>(
        &mut self,
        source: &S,
        filter: Filter,
    ) -> Result<&Snapshot, StoreError>
    where
        S: RowSource + ?Sized,
    {
        match self.entries.entry(filter) {
            Entry::Occupied(e) => {
                debug!(?filter, "snapshot cache hit");
                Ok(e.into_mut())
            }
            Entry::Vacant(e) => {
                let snapshot = source.fetch(filter).await?;
                self.fetches += 1;
                debug!(?filter, rows = snapshot.len(), "snapshot cache filled");
                Ok(e.insert(snapshot))
            }
        }
    }

    /// The cached snapshot for `filter`, without fetching.
    pub fn peek(&self, filter: Filter) -> Option<&Snapshot> {
        self.entries.get(&filter)
    }

    /// Drop the snapshot for one filter, or every snapshot when `None`.
    pub fn invalidate(&mut self, filter: Option<Filter>) {
        match filter {
            Some(f) => {
                self.entries.remove(&f);
            }
            None => self.entries.clear(),
        }
        debug!(?filter, "snapshot cache invalidated");
    }

    /// Number of fetches that filled the cache.
    pub fn fetches(&self) -> u64 {
        self.fetches
    }
}
