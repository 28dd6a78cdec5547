//! Review guidance keyed by systematic-review id.
//!
//! The prompt table is a local CSV with at least `SR` and `Prompt` columns.
//! It is read through Arrow's CSV reader with every column typed as `Utf8`
//! so that odd keys (`3.0`, `SR-4`) reach the coercion step instead of
//! failing type inference.

use std::collections::HashMap;
use std::fs::File;
use std::io::Seek;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use arrow::array::{Array, LargeStringArray, StringArray};
use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use minerva_core::record::coerce_int;
use minerva_core::sheet;
use tracing::{debug, info, warn};

use crate::StoreError;

/// Rows sampled to discover the header.
const INFER_RECORDS: usize = 16;

/// `sr_id` → guidance text.
#[derive(Debug, Clone, Default)]
pub struct PromptLookup {
    prompts: HashMap<i64, String>,
}

impl PromptLookup {
    /// Load the prompt table from `path`.
    ///
    /// Keys that do not parse as integers coerce to 0. When two rows share a
    /// key the later row wins.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let (schema, batches) = read_prompt_table(path)?;
        for column in [sheet::PROMPT_SR, sheet::PROMPT_TEXT] {
            if schema.index_of(column).is_err() {
                return Err(StoreError::MissingColumn {
                    path: path.to_path_buf(),
                    column,
                });
            }
        }
        let lookup = Self::from_batches(&batches);
        info!(path = %path.display(), count = lookup.len(), "loaded prompts");
        Ok(lookup)
    }

    /// Build a lookup from batches that carry `SR` and `Prompt` columns.
    /// Batches without them contribute nothing.
    pub fn from_batches(batches: &[RecordBatch]) -> Self {
        let mut prompts = HashMap::new();
        for batch in batches {
            let (Some(sr_col), Some(text_col)) = (
                batch.column_by_name(sheet::PROMPT_SR),
                batch.column_by_name(sheet::PROMPT_TEXT),
            ) else {
                continue;
            };
            for row in 0..batch.num_rows() {
                let raw_key = get_string(sr_col.as_ref(), row).unwrap_or_default();
                let sr_id = coerce_int(&raw_key);
                let text = get_string(text_col.as_ref(), row).unwrap_or_default();
                if prompts.insert(sr_id, text).is_some() {
                    warn!(sr_id, raw = %raw_key, "duplicate prompt key, keeping the later row");
                }
            }
        }
        Self { prompts }
    }

    /// Guidance for `sr_id`, or the empty string when there is none.
    pub fn guidance_for(&self, sr_id: i64) -> &str {
        self.get(sr_id).unwrap_or("")
    }

    pub fn get(&self, sr_id: i64) -> Option<&str> {
        self.prompts.get(&sr_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    /// Entries in ascending `sr_id` order.
    pub fn entries(&self) -> Vec<(i64, &str)> {
        let mut out: Vec<(i64, &str)> = self
            .prompts
            .iter()
            .map(|(k, v)| (*k, v.as_str()))
            .collect();
        out.sort_by_key(|(k, _)| *k);
        out
    }
}

/// A [`PromptLookup`] that reloads when its file's modification time changes.
///
/// The cache key is the path plus the mtime seen at the last successful load.
#[derive(Debug)]
pub struct PromptCache {
    path: PathBuf,
    modified: Option<SystemTime>,
    lookup: PromptLookup,
}

impl PromptCache {
    /// Load the prompt table once. A bad file is a [`StoreError::is_config`] error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let modified = modified_at(&path)?;
        let lookup = PromptLookup::load(&path)?;
        Ok(Self {
            path,
            modified,
            lookup,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn key(&self) -> (&Path, Option<SystemTime>) {
        (&self.path, self.modified)
    }

    /// The last successfully loaded lookup, without checking the file.
    pub fn lookup(&self) -> &PromptLookup {
        &self.lookup
    }

    /// The current lookup, reloaded first if the file changed on disk.
    ///
    /// A failed reload leaves the previous lookup in place and is retried
    /// on the next call.
    pub fn current(&mut self) -> Result<&PromptLookup, StoreError> {
        let modified = modified_at(&self.path)?;
        if modified != self.modified {
            debug!(path = %self.path.display(), "prompt file changed, reloading");
            self.lookup = PromptLookup::load(&self.path)?;
            self.modified = modified;
        }
        Ok(&self.lookup)
    }
}

fn modified_at(path: &Path) -> Result<Option<SystemTime>, StoreError> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(meta.modified().ok()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(StoreError::PromptsNotFound(path.to_path_buf()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Read the whole table with every column as nullable `Utf8`.
fn read_prompt_table(path: &Path) -> Result<(SchemaRef, Vec<RecordBatch>), StoreError> {
    let malformed = |source| StoreError::MalformedPrompts {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => StoreError::PromptsNotFound(path.to_path_buf()),
        _ => StoreError::Io(e),
    })?;

    let format = Format::default().with_header(true);
    let (inferred, _) = format
        .infer_schema(&mut file, Some(INFER_RECORDS))
        .map_err(malformed)?;
    let fields: Vec<Field> = inferred
        .fields()
        .iter()
        .map(|f| Field::new(f.name(), DataType::Utf8, true))
        .collect();
    let schema = Arc::new(Schema::new(fields));

    file.rewind()?;
    let reader = ReaderBuilder::new(schema.clone())
        .with_format(format)
        .build(file)
        .map_err(malformed)?;
    let batches = reader
        .collect::<Result<Vec<_>, _>>()
        .map_err(malformed)?;
    Ok((schema, batches))
}

/// Extract a string value from an Arrow array (handles Utf8 and LargeUtf8).
fn get_string(col: &dyn Array, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    col.as_any()
        .downcast_ref::<StringArray>()
        .map(|arr| arr.value(row).to_string())
        .or_else(|| {
            col.as_any()
                .downcast_ref::<LargeStringArray>()
                .map(|arr| arr.value(row).to_string())
        })
}
