//! Per-session review state: cache, cursor, reveal gate and the unsaved draft.
//!
//! Everything the form needs between two user actions lives here and is
//! passed explicitly; nothing is global.

use std::path::Path;

use chrono::Utc;
use minerva_core::{
    AiLabel, Decision, Direction, Filter, FormVariant, NavError, Navigator, Progress, Reanchor,
    Record, RevealGate, RevealMode, RowUpdate, Snapshot,
};
use minerva_store::{RowSource, SnapshotCache, StoreError};
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub filter: Filter,
    pub variant: FormVariant,
    pub reveal: RevealMode,
    /// Stamped into `Reviewer` on every save when set.
    pub reviewer: Option<String>,
}

/// Local edits to the current row that have not been saved yet.
///
/// Each field is `None` until the reviewer sets it; only set fields are
/// written back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    pub decision: Option<Decision>,
    pub ai_label: Option<AiLabel>,
    pub ai_justification: Option<String>,
}

impl Draft {
    /// The decision the row will hold after saving this draft.
    pub fn decision_for(&self, record: &Record) -> Decision {
        self.decision.unwrap_or(record.decision)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(i64),
    /// The store did not confirm the write. The draft is kept.
    Failed(i64),
    /// No decision chosen; nothing was sent.
    MissingDecision,
    /// The view is empty.
    NoRecord,
}

pub struct ReviewSession<S> {
    source: S,
    cache: SnapshotCache,
    filter: Filter,
    nav: Navigator,
    reveal: RevealGate,
    variant: FormVariant,
    reviewer: Option<String>,
    draft: Draft,
    current_row: Option<i64>,
}

impl<S: RowSource> ReviewSession<S> {
    pub fn new(source: S, options: SessionOptions) -> Self {
        Self {
            source,
            cache: SnapshotCache::new(),
            filter: options.filter,
            nav: Navigator::new(),
            reveal: RevealGate::new(options.reveal),
            variant: options.variant,
            reviewer: options.reviewer,
            draft: Draft::default(),
            current_row: None,
        }
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn variant(&self) -> FormVariant {
        self.variant
    }

    /// The snapshot currently on screen, if one has been fetched.
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.cache.peek(self.filter)
    }

    pub fn current(&self) -> Option<&Record> {
        self.snapshot().and_then(|s| self.nav.current(s))
    }

    /// `(cursor, len)` of the current view.
    pub fn position(&self) -> Option<(usize, usize)> {
        self.snapshot().map(|s| (self.nav.cursor(), s.len()))
    }

    pub fn progress(&self) -> Option<Progress> {
        self.snapshot().map(Snapshot::progress)
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn is_revealed(&self, record: &Record) -> bool {
        self.reveal.is_revealed(record)
    }

    /// Effective decision for the current row: the draft's choice, else the
    /// stored value.
    pub fn decision(&self) -> Decision {
        self.current()
            .map(|r| self.draft.decision_for(r))
            .unwrap_or_default()
    }

    /// Serve the view from cache (fetching on a miss) and re-anchor the
    /// cursor on the row that was current before, by `row_id`.
    pub async fn refresh(&mut self) -> Result<Reanchor, StoreError> {
        let previous = self.current_row;
        let snapshot = self.cache.get_or_fetch(&self.source, self.filter).await?;
        let outcome = self.nav.reanchor(previous, snapshot);
        if let (Reanchor::Reset, Some(row_id)) = (outcome, previous) {
            info!(row_id, "row left the current view, returning to the first row");
        }
        self.sync_current();
        Ok(outcome)
    }

    /// Drop every cached snapshot and fetch again.
    pub async fn reload(&mut self) -> Result<Reanchor, StoreError> {
        self.cache.invalidate(None);
        self.refresh().await
    }

    pub async fn set_filter(&mut self, filter: Filter) -> Result<Reanchor, StoreError> {
        self.filter = filter;
        self.refresh().await
    }

    pub fn goto_index(&mut self, index: usize) -> Result<(), NavError> {
        let Some(snapshot) = self.cache.peek(self.filter) else {
            return Err(NavError::IndexOutOfRange { index, len: 0 });
        };
        self.nav.goto_index(index, snapshot)?;
        self.sync_current();
        Ok(())
    }

    pub fn goto_row_id(&mut self, row_id: i64) -> Result<(), NavError> {
        let Some(snapshot) = self.cache.peek(self.filter) else {
            return Err(NavError::NotFound(row_id));
        };
        self.nav.goto_row_id(row_id, snapshot)?;
        self.sync_current();
        Ok(())
    }

    /// Step one row; a no-op at either end. Returns whether the cursor moved.
    pub fn advance(&mut self, direction: Direction) -> bool {
        let Some(snapshot) = self.cache.peek(self.filter) else {
            return false;
        };
        let moved = self.nav.advance(direction, snapshot);
        if moved {
            self.sync_current();
        }
        moved
    }

    /// Choose a decision for the current row. Rejects values the form does
    /// not offer.
    pub fn set_decision(&mut self, decision: Decision) -> bool {
        if !self.variant.accepts(decision) {
            return false;
        }
        self.draft.decision = Some(decision);
        true
    }

    /// Override the AI label. Refused while the AI fields of the current row
    /// are hidden.
    pub fn set_ai_label(&mut self, label: AiLabel) -> bool {
        if !self.current_revealed() {
            return false;
        }
        self.draft.ai_label = Some(label);
        true
    }

    /// Override the AI justification. Refused while hidden, as above.
    pub fn set_ai_justification(&mut self, text: String) -> bool {
        if !self.current_revealed() {
            return false;
        }
        self.draft.ai_justification = Some(text);
        true
    }

    /// Write the draft for the current row.
    ///
    /// On success the whole cache is invalidated and the view re-fetched
    /// before returning, so the next render shows the stored state. On
    /// failure the draft is left intact for a retry. The error case is only
    /// the re-fetch after a successful write.
    pub async fn save(&mut self) -> Result<SaveOutcome, StoreError> {
        let Some(row_id) = self.current().map(|r| r.row_id) else {
            return Ok(SaveOutcome::NoRecord);
        };
        if self.decision().is_unset() {
            warn!(row_id, "save attempted without a decision");
            return Ok(SaveOutcome::MissingDecision);
        }

        let update = self.build_update();
        if !self.source.save(row_id, &update).await {
            return Ok(SaveOutcome::Failed(row_id));
        }

        self.cache.invalidate(None);
        self.reveal.mark_saved(row_id);
        self.draft = Draft::default();
        self.refresh().await?;
        Ok(SaveOutcome::Saved(row_id))
    }

    /// Write the current view to `path` as CSV.
    pub fn export(&self, path: &Path) -> Result<usize, StoreError> {
        match self.snapshot() {
            Some(snapshot) => minerva_store::write_snapshot_csv(snapshot, path),
            None => minerva_store::write_snapshot_csv(&Snapshot::default(), path),
        }
    }

    fn build_update(&self) -> RowUpdate {
        let mut update = RowUpdate::new();
        if let Some(decision) = self.draft.decision {
            update = update.decision(decision);
        }
        if let Some(label) = &self.draft.ai_label {
            update = update.ai_label(label);
        }
        if let Some(text) = &self.draft.ai_justification {
            update = update.ai_justification(text);
        }
        if let Some(name) = &self.reviewer {
            update = update.reviewer(name);
        }
        update.reviewed_at(Utc::now())
    }

    /// Bring draft and reveal state in line with the row under the cursor.
    fn sync_current(&mut self) {
        let current = self
            .cache
            .peek(self.filter)
            .and_then(|s| self.nav.current(s));
        let row_id = current.map(|r| r.row_id);
        if row_id != self.current_row {
            self.draft = Draft::default();
            self.current_row = row_id;
        }
        self.reveal.observe(row_id);
    }

    fn current_revealed(&self) -> bool {
        self.current().is_some_and(|r| self.reveal.is_revealed(r))
    }
}
