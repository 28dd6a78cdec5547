//! Vertical card display for screening records.
//!
//! Renders the current record as a grouped, human-readable card. Output is
//! built as a `String` so the form loop can write it to any sink.

use minerva_core::{Decision, Filter, Progress, Record};

use crate::session::Draft;

const LABEL_WIDTH: usize = 14;
const WRAP_WIDTH: usize = 96;
const TITLE_WIDTH: usize = 70;

/// Everything the card shows for one row.
pub struct Card<'a> {
    pub record: &'a Record,
    /// 0-based position in the current view.
    pub position: usize,
    pub total: usize,
    pub filter: Filter,
    pub guidance: &'a str,
    pub revealed: bool,
    pub draft: &'a Draft,
    pub choices: &'a [Decision],
}

// ── Public API ──

pub fn render_card(card: &Card<'_>) -> String {
    let record = card.record;
    let mut out = String::new();

    let view = match card.filter {
        Filter::All => "all rows",
        Filter::UnreviewedOnly => "unreviewed only",
    };
    out.push_str(&format!(
        "=== Row {} ({} of {}, {}) ===\n",
        record.row_id,
        card.position + 1,
        card.total,
        view
    ));
    if !record.title.is_empty() {
        out.push_str(&record.title);
        out.push('\n');
    }
    out.push('\n');

    out.push_str("Record\n");
    field(&mut out, "SR", &record.sr_id.to_string());
    field(&mut out, "Decision", &record.decision.to_string());
    field(&mut out, "Reviewer", &record.reviewer);
    field(&mut out, "Reviewed at", &record.reviewed_at);
    out.push('\n');

    if !record.abstract_text.is_empty() {
        out.push_str("Abstract\n");
        block(&mut out, &record.abstract_text);
        out.push('\n');
    }

    out.push_str(&format!("Guidance (SR {})\n", record.sr_id));
    if card.guidance.is_empty() {
        out.push_str("  (no guidance for this SR)\n");
    } else {
        block(&mut out, card.guidance);
    }
    out.push('\n');

    out.push_str("AI\n");
    if card.revealed {
        field(&mut out, "Label", &record.ai_label.to_string());
        field(&mut out, "Justification", &record.ai_justification);
    } else {
        out.push_str("  hidden until your decision for this row is saved\n");
    }
    out.push('\n');

    out.push_str("Your edit\n");
    let choices: Vec<&str> = card.choices.iter().map(|d| d.as_str()).collect();
    field(
        &mut out,
        "Decision",
        &format!(
            "{}  [{}]",
            card.draft.decision_for(record),
            choices.join(" / ")
        ),
    );
    if let Some(label) = &card.draft.ai_label {
        field(&mut out, "AI label", &label.to_string());
    }
    if let Some(text) = &card.draft.ai_justification {
        field(&mut out, "Justification", text);
    }

    out
}

pub fn render_progress(progress: &Progress) -> String {
    let mut out = format!(
        "Total rows: {}  reviewed: {}  unreviewed: {}",
        progress.total,
        progress.reviewed,
        progress.unreviewed()
    );
    for (decision, count) in &progress.by_decision {
        out.push_str(&format!("  {decision}: {count}"));
    }
    out
}

/// One line per record for listings.
pub fn render_row_line(record: &Record) -> String {
    format!(
        "{:>6}  {:<9}  SR {:<4}  {}",
        record.row_id,
        record.decision.as_str(),
        record.sr_id,
        truncate(&record.title, TITLE_WIDTH)
    )
}

// ── Helpers ──

fn field(out: &mut String, label: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    out.push_str(&format!("  {:<width$} {}\n", label, value, width = LABEL_WIDTH));
}

fn block(out: &mut String, text: &str) {
    for line in wrap(text, WRAP_WIDTH) {
        out.push_str("  ");
        out.push_str(&line);
        out.push('\n');
    }
}

/// Greedy word wrap. Words longer than `width` get a line of their own.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > width {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        lines.push(line);
    }
    lines
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}
