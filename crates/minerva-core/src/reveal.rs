//! Two-phase reveal of AI fields for blinded comparison.
//!
//! In blinded mode the AI label and justification stay hidden until the
//! reviewer's own decision for the row is committed: either saved during
//! this visit, or already persisted in the sheet. Reveal state is keyed by
//! `row_id`, never by cursor position.

use crate::record::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevealMode {
    /// AI fields are always shown.
    #[default]
    Open,
    /// AI fields are shown only once the reviewer's decision is committed.
    Blinded,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevealGate {
    mode: RevealMode,
    viewing: Option<i64>,
    saved: Option<i64>,
}

impl RevealGate {
    pub fn new(mode: RevealMode) -> Self {
        Self {
            mode,
            viewing: None,
            saved: None,
        }
    }

    pub fn mode(&self) -> RevealMode {
        self.mode
    }

    /// Record which row is on screen. Moving to a different row drops the
    /// reveal earned by a save on the previous one.
    pub fn observe(&mut self, row_id: Option<i64>) {
        if self.viewing != row_id {
            self.viewing = row_id;
            self.saved = None;
        }
    }

    /// A save for `row_id` succeeded.
    pub fn mark_saved(&mut self, row_id: i64) {
        self.viewing = Some(row_id);
        self.saved = Some(row_id);
    }

    pub fn is_revealed(&self, record: &Record) -> bool {
        match self.mode {
            RevealMode::Open => true,
            RevealMode::Blinded => self.saved == Some(record.row_id) || record.is_reviewed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Decision;

    fn rec(row_id: i64, decision: Decision) -> Record {
        let mut r = Record::new(row_id);
        r.decision = decision;
        r
    }

    #[test]
    fn open_mode_always_reveals() {
        let gate = RevealGate::new(RevealMode::Open);
        assert!(gate.is_revealed(&rec(1, Decision::Unset)));
    }

    #[test]
    fn blinded_hides_until_saved() {
        let mut gate = RevealGate::new(RevealMode::Blinded);
        gate.observe(Some(1));
        let unsaved = rec(1, Decision::Unset);
        assert!(!gate.is_revealed(&unsaved));

        gate.mark_saved(1);
        assert!(gate.is_revealed(&unsaved));
    }

    #[test]
    fn moving_away_resets_save_reveal() {
        let mut gate = RevealGate::new(RevealMode::Blinded);
        gate.observe(Some(1));
        gate.mark_saved(1);
        gate.observe(Some(2));
        gate.observe(Some(1));
        assert!(!gate.is_revealed(&rec(1, Decision::Unset)));
    }

    #[test]
    fn persisted_decision_reveals_on_return() {
        let mut gate = RevealGate::new(RevealMode::Blinded);
        gate.observe(Some(2));
        gate.observe(Some(1));
        assert!(gate.is_revealed(&rec(1, Decision::Include)));
    }

    #[test]
    fn observing_same_row_keeps_reveal() {
        let mut gate = RevealGate::new(RevealMode::Blinded);
        gate.mark_saved(4);
        gate.observe(Some(4));
        assert!(gate.is_revealed(&rec(4, Decision::Unset)));
    }
}
