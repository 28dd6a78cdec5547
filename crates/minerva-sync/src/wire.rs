//! JSON envelopes exchanged with the sheet endpoint, and row normalisation.

use minerva_core::{Record, RowUpdate, sheet};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// `{"ok": true, "rows": [...]}` or `{"ok": false, "error": "..."}`.
#[derive(Debug, Deserialize)]
pub(crate) struct FetchEnvelope {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub rows: Vec<Map<String, Value>>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SaveEnvelope {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SaveRequest<'a> {
    pub row: i64,
    pub fields: &'a RowUpdate,
}

/// Normalise raw rows into records. Rows without a usable `_row` are dropped.
pub(crate) fn records_from_rows(rows: &[Map<String, Value>]) -> Vec<Record> {
    let records: Vec<Record> = rows.iter().filter_map(record_from_row).collect();
    if records.len() != rows.len() {
        warn!(
            dropped = rows.len() - records.len(),
            "rows without a usable _row were skipped"
        );
    }
    records
}

fn record_from_row(row: &Map<String, Value>) -> Option<Record> {
    let row_id = row.get(sheet::ROW).and_then(value_int)?;
    let mut record = Record::new(row_id);
    for (column, value) in row {
        if column != sheet::ROW {
            record.apply_field(column, &value_text(value));
        }
    }
    Some(record)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.to_string(),
        },
        other => other.to_string(),
    }
}

fn value_int(value: &Value) -> Option<i64> {
    let from_float = |f: f64| f.is_finite().then(|| f.trunc() as i64);
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(from_float)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(from_float))
        }
        _ => None,
    }
}
