//! Screening records and the closed value sets they carry.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::schema::sheet;

/// A reviewer decision, normalised from the sheet's free-text column.
///
/// `Unset` is the initial state and the only value that counts as unreviewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Decision {
    #[default]
    Unset,
    Include,
    Exclude,
    Unclear,
    Yes,
    No,
}

impl Decision {
    /// Normalise a raw sheet value.
    ///
    /// Blank text is `Unset`. Unrecognised non-blank text becomes `Unclear`
    /// so the row still counts as reviewed.
    pub fn normalize(raw: &str) -> Self {
        let s = raw.trim();
        if s.is_empty() {
            return Decision::Unset;
        }
        match Self::parse(s) {
            Some(d) => d,
            None => {
                warn!(value = %s, "unrecognised decision, treating as Unclear");
                Decision::Unclear
            }
        }
    }

    /// Parse a decision label, case-insensitively. Blank text is not a label.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "include" => Some(Decision::Include),
            "exclude" => Some(Decision::Exclude),
            "unclear" | "maybe" => Some(Decision::Unclear),
            "yes" | "y" => Some(Decision::Yes),
            "no" | "n" => Some(Decision::No),
            _ => None,
        }
    }

    /// The value written to the sheet.
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Unset => "",
            Decision::Include => "Include",
            Decision::Exclude => "Exclude",
            Decision::Unclear => "Unclear",
            Decision::Yes => "Yes",
            Decision::No => "No",
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Decision::Unset)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Unset => f.write_str("(unset)"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// The AI label column. The sheet spells a positive label several ways
/// (`yes`, `1`, `true`, ...); they all collapse to `Yes` here.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AiLabel {
    #[default]
    Absent,
    Yes,
    No,
    Other(String),
}

impl AiLabel {
    pub fn normalize(raw: &str) -> Self {
        let s = raw.trim();
        match s.to_ascii_lowercase().as_str() {
            "" => AiLabel::Absent,
            "yes" | "y" | "1" | "true" | "include" => AiLabel::Yes,
            "no" | "n" | "0" | "false" | "exclude" => AiLabel::No,
            _ => AiLabel::Other(s.to_string()),
        }
    }

    /// The value written to the sheet.
    pub fn as_str(&self) -> &str {
        match self {
            AiLabel::Absent => "",
            AiLabel::Yes => "Yes",
            AiLabel::No => "No",
            AiLabel::Other(s) => s,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, AiLabel::Absent)
    }
}

impl fmt::Display for AiLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiLabel::Absent => f.write_str("(none)"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Which decision set a review form offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormVariant {
    /// Include / Exclude / Unclear.
    #[default]
    Screening,
    /// Yes / No.
    Binary,
}

impl FormVariant {
    pub fn choices(&self) -> &'static [Decision] {
        match self {
            FormVariant::Screening => &[Decision::Include, Decision::Exclude, Decision::Unclear],
            FormVariant::Binary => &[Decision::Yes, Decision::No],
        }
    }

    pub fn accepts(&self, decision: Decision) -> bool {
        self.choices().contains(&decision)
    }
}

/// One reviewable row of the remote sheet.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    /// Stable identifier assigned by the remote store (`_row`).
    pub row_id: i64,
    /// Foreign key into the prompt table; 0 when absent.
    pub sr_id: i64,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub decision: Decision,
    pub ai_label: AiLabel,
    pub ai_justification: String,
    pub reviewer: String,
    /// Free-form timestamp string stamped by the last save.
    pub reviewed_at: String,
}

impl Record {
    pub fn new(row_id: i64) -> Self {
        Self {
            row_id,
            ..Self::default()
        }
    }

    pub fn is_reviewed(&self) -> bool {
        !self.decision.is_unset()
    }

    /// Set a field from its sheet column name and raw text.
    ///
    /// Returns `false` for columns the record does not carry. `_row` is
    /// ignored here: the identifier is fixed at construction.
    pub fn apply_field(&mut self, column: &str, value: &str) -> bool {
        match column {
            sheet::SR => self.sr_id = coerce_int(value),
            sheet::TITLE => self.title = value.to_string(),
            sheet::ABSTRACT => self.abstract_text = value.to_string(),
            sheet::DECISION => self.decision = Decision::normalize(value),
            sheet::AI => self.ai_label = AiLabel::normalize(value),
            sheet::AI_JUSTIFICATION => self.ai_justification = value.to_string(),
            sheet::REVIEWER => self.reviewer = value.to_string(),
            sheet::REVIEWED_AT => self.reviewed_at = value.to_string(),
            _ => return false,
        }
        true
    }
}

/// Coerce sheet text to an integer.
///
/// Accepts plain integers and finite decimals (truncated). Anything else,
/// including blank text, is 0.
pub fn coerce_int(raw: &str) -> i64 {
    let s = raw.trim();
    if let Ok(n) = s.parse::<i64>() {
        return n;
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() => f.trunc() as i64,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_blank_is_unset() {
        assert_eq!(Decision::normalize(""), Decision::Unset);
        assert_eq!(Decision::normalize("   "), Decision::Unset);
    }

    #[test]
    fn decision_case_and_whitespace_insensitive() {
        assert_eq!(Decision::normalize(" include "), Decision::Include);
        assert_eq!(Decision::normalize("EXCLUDE"), Decision::Exclude);
        assert_eq!(Decision::normalize("Yes"), Decision::Yes);
        assert_eq!(Decision::normalize("n"), Decision::No);
    }

    #[test]
    fn decision_unknown_text_still_counts_as_reviewed() {
        let d = Decision::normalize("needs full text");
        assert_eq!(d, Decision::Unclear);
        assert!(!d.is_unset());
    }

    #[test]
    fn decision_parse_rejects_blank() {
        assert_eq!(Decision::parse(""), None);
        assert_eq!(Decision::parse("later"), None);
    }

    #[test]
    fn decision_sheet_values() {
        assert_eq!(Decision::Unset.as_str(), "");
        assert_eq!(Decision::Include.as_str(), "Include");
        assert_eq!(Decision::Unset.to_string(), "(unset)");
    }

    #[test]
    fn ai_label_spellings_collapse() {
        for raw in ["yes", "YES", "1", "true", "Include"] {
            assert_eq!(AiLabel::normalize(raw), AiLabel::Yes, "{raw}");
        }
        for raw in ["no", "0", "False", "exclude"] {
            assert_eq!(AiLabel::normalize(raw), AiLabel::No, "{raw}");
        }
        assert_eq!(AiLabel::normalize(" "), AiLabel::Absent);
        assert_eq!(
            AiLabel::normalize(" uncertain "),
            AiLabel::Other("uncertain".into())
        );
    }

    #[test]
    fn variant_choices() {
        assert!(FormVariant::Screening.accepts(Decision::Unclear));
        assert!(!FormVariant::Screening.accepts(Decision::Yes));
        assert!(FormVariant::Binary.accepts(Decision::No));
        assert!(!FormVariant::Binary.accepts(Decision::Unset));
    }

    #[test]
    fn apply_field_sets_known_columns() {
        let mut rec = Record::new(7);
        assert!(rec.apply_field("Title", "Appendicitis in children"));
        assert!(rec.apply_field("SR", "3"));
        assert!(rec.apply_field("Poenaru_Decision", "exclude"));
        assert!(rec.apply_field("AI", "1"));
        assert!(!rec.apply_field("Unknown", "x"));
        assert_eq!(rec.row_id, 7);
        assert_eq!(rec.sr_id, 3);
        assert_eq!(rec.title, "Appendicitis in children");
        assert_eq!(rec.decision, Decision::Exclude);
        assert_eq!(rec.ai_label, AiLabel::Yes);
        assert!(rec.is_reviewed());
    }

    #[test]
    fn coerce_int_variants() {
        assert_eq!(coerce_int("42"), 42);
        assert_eq!(coerce_int(" 3.0 "), 3);
        assert_eq!(coerce_int("3.9"), 3);
        assert_eq!(coerce_int("abc"), 0);
        assert_eq!(coerce_int(""), 0);
        assert_eq!(coerce_int("NaN"), 0);
    }

    #[test]
    fn record_json_uses_abstract_key() {
        let mut rec = Record::new(1);
        rec.abstract_text = "Background: ...".into();
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["abstract"], "Background: ...");
        assert_eq!(json["row_id"], 1);
    }
}
