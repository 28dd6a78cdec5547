//! Ordered, de-duplicated copies of the remote sheet.

use std::collections::BTreeMap;

use tracing::warn;

use crate::record::{Decision, Record};

/// Which rows a snapshot keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Filter {
    #[default]
    All,
    /// Only rows whose decision is unset.
    UnreviewedOnly,
}

impl Filter {
    pub fn from_unreviewed(unreviewed_only: bool) -> Self {
        if unreviewed_only {
            Filter::UnreviewedOnly
        } else {
            Filter::All
        }
    }

    pub fn keeps(&self, record: &Record) -> bool {
        match self {
            Filter::All => true,
            Filter::UnreviewedOnly => !record.is_reviewed(),
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Filter::All => Filter::UnreviewedOnly,
            Filter::UnreviewedOnly => Filter::All,
        }
    }
}

/// Records as of one fetch, sorted by `row_id` ascending with no duplicate ids.
///
/// A snapshot is never patched: after a write it is discarded and fetched again.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    filter: Filter,
    records: Vec<Record>,
}

impl Snapshot {
    /// Build a snapshot from fetched records, then apply `filter`.
    ///
    /// On duplicate `row_id` the first record in fetch order wins, whatever
    /// the filter, so every filtered view is a subset of the unfiltered one.
    pub fn from_records(mut records: Vec<Record>, filter: Filter) -> Self {
        // Stable sort keeps fetch order among equal ids.
        records.sort_by_key(|r| r.row_id);
        let before = records.len();
        records.dedup_by_key(|r| r.row_id);
        if records.len() != before {
            warn!(
                dropped = before - records.len(),
                "duplicate _row values in fetched sheet"
            );
        }
        records.retain(|r| filter.keeps(r));
        Self { filter, records }
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    /// Position of `row_id` in this snapshot.
    pub fn position_of(&self, row_id: i64) -> Option<usize> {
        self.records
            .binary_search_by_key(&row_id, |r| r.row_id)
            .ok()
    }

    pub fn find(&self, row_id: i64) -> Option<&Record> {
        self.position_of(row_id).map(|i| &self.records[i])
    }

    pub fn progress(&self) -> Progress {
        let mut by_decision = BTreeMap::new();
        let mut reviewed = 0;
        for r in &self.records {
            if r.is_reviewed() {
                reviewed += 1;
                *by_decision.entry(r.decision.as_str()).or_insert(0) += 1;
            }
        }
        Progress {
            total: self.records.len(),
            reviewed,
            by_decision,
        }
    }
}

/// Review progress over one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub total: usize,
    pub reviewed: usize,
    /// Sheet value → count, reviewed rows only.
    pub by_decision: BTreeMap<&'static str, usize>,
}

impl Progress {
    pub fn unreviewed(&self) -> usize {
        self.total - self.reviewed
    }

    pub fn count(&self, decision: Decision) -> usize {
        self.by_decision
            .get(decision.as_str())
            .copied()
            .unwrap_or(0)
    }
}
