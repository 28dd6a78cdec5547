//! CSV export of a snapshot.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::csv::WriterBuilder;
use arrow::record_batch::RecordBatch;
use minerva_core::{Record, Snapshot, sheet};
use tracing::info;

use crate::StoreError;

/// Convert a snapshot into one batch laid out as [`sheet::snapshot_schema`].
pub fn snapshot_to_batch(snapshot: &Snapshot) -> Result<RecordBatch, StoreError> {
    let records = snapshot.records();
    let text = |f: fn(&Record) -> &str| -> ArrayRef {
        Arc::new(StringArray::from_iter_values(records.iter().map(f)))
    };

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(records.iter().map(|r| r.row_id))),
        Arc::new(Int64Array::from_iter_values(records.iter().map(|r| r.sr_id))),
        text(|r| &r.title),
        text(|r| &r.abstract_text),
        text(|r| r.decision.as_str()),
        text(|r| r.ai_label.as_str()),
        text(|r| &r.ai_justification),
        text(|r| &r.reviewer),
        text(|r| &r.reviewed_at),
    ];

    Ok(RecordBatch::try_new(
        Arc::new(sheet::snapshot_schema()),
        columns,
    )?)
}

/// Write `snapshot` to `path` as CSV with a header row. Returns rows written.
pub fn write_snapshot_csv(snapshot: &Snapshot, path: &Path) -> Result<usize, StoreError> {
    let batch = snapshot_to_batch(snapshot)?;
    let file = File::create(path)?;
    let mut writer = WriterBuilder::new()
        .with_header(true)
        .build(BufWriter::new(file));
    writer.write(&batch)?;
    // Dropping a BufWriter swallows the final write error.
    writer.into_inner().flush()?;
    info!(path = %path.display(), rows = batch.num_rows(), "exported snapshot");
    Ok(batch.num_rows())
}

#[cfg(test)]
mod tests {
    use super::*;
    use minerva_core::{AiLabel, Decision, Filter};

    fn snapshot() -> Snapshot {
        let mut a = Record::new(2);
        a.sr_id = 1;
        a.title = "Laparoscopic appendectomy, a review".into();
        a.decision = Decision::Include;
        a.ai_label = AiLabel::Yes;
        let b = Record::new(1);
        Snapshot::from_records(vec![a, b], Filter::All)
    }

    #[test]
    fn batch_follows_sheet_schema() {
        let batch = snapshot_to_batch(&snapshot()).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.schema().as_ref(), &sheet::snapshot_schema());
        let ids = batch
            .column(0)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(ids.values().to_vec(), vec![1, 2]);
    }

    #[test]
    fn empty_snapshot_exports_header_only() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("empty.csv");
        let rows = write_snapshot_csv(&Snapshot::default(), &path).unwrap();
        assert_eq!(rows, 0);
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text.trim_end(),
            "_row,SR,Title,Abstract,Poenaru_Decision,AI,AI_Justification,Reviewer,Reviewed_At"
        );
    }

    #[test]
    fn csv_quotes_embedded_commas() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.csv");
        write_snapshot_csv(&snapshot(), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("1,0,"));
        assert!(lines[2].contains("\"Laparoscopic appendectomy, a review\""));
        assert!(lines[2].contains(",Include,Yes,"));
    }

    #[test]
    fn large_export_is_fully_flushed() {
        let records = (1..=2_000)
            .map(|id| {
                let mut r = Record::new(id);
                r.abstract_text = "Background and methods. ".repeat(4);
                r
            })
            .collect();
        let snapshot = Snapshot::from_records(records, Filter::All);
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("big.csv");
        assert_eq!(write_snapshot_csv(&snapshot, &path).unwrap(), 2_000);
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2_001);
        assert!(text.lines().last().unwrap().starts_with("2000,"));
    }

    #[test]
    fn unwritable_path_is_io_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = write_snapshot_csv(&snapshot(), tmp.path()).unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
    }
}
