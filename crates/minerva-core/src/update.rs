//! Partial row updates sent to the remote store.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::record::{AiLabel, Decision};
use crate::schema::sheet;

/// Column → value pairs for one row. Omitted columns keep their remote value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RowUpdate {
    fields: BTreeMap<String, String>,
}

impl RowUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decision(mut self, decision: Decision) -> Self {
        self.set(sheet::DECISION, decision.as_str());
        self
    }

    pub fn ai_label(mut self, label: &AiLabel) -> Self {
        self.set(sheet::AI, label.as_str());
        self
    }

    pub fn ai_justification(mut self, text: &str) -> Self {
        self.set(sheet::AI_JUSTIFICATION, text);
        self
    }

    pub fn reviewer(mut self, name: &str) -> Self {
        self.set(sheet::REVIEWER, name);
        self
    }

    pub fn reviewed_at(mut self, at: DateTime<Utc>) -> Self {
        self.set(
            sheet::REVIEWED_AT,
            &at.to_rfc3339_opts(SecondsFormat::Secs, true),
        );
        self
    }

    pub fn set(&mut self, column: &str, value: &str) {
        self.fields.insert(column.to_string(), value.to_string());
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}
