use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("prompt file not found: {0}")]
    PromptsNotFound(std::path::PathBuf),

    #[error("prompt file {path} is missing required column '{column}'")]
    MissingColumn {
        path: std::path::PathBuf,
        column: &'static str,
    },

    #[error("malformed prompt file {path}: {source}")]
    MalformedPrompts {
        path: std::path::PathBuf,
        #[source]
        source: arrow::error::ArrowError,
    },

    #[error("remote store error: {0}")]
    Remote(String),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Errors caused by the local reference file. Fatal at startup.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            StoreError::PromptsNotFound(_)
                | StoreError::MissingColumn { .. }
                | StoreError::MalformedPrompts { .. }
        )
    }
}
