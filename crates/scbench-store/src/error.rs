//! Store error types

use scbench_core::StagingError;
use std::path::PathBuf;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Staging(#[from] StagingError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid results document: {0}")]
    Json(#[from] serde_json::Error),

    /// A CSV row that does not match the table layout
    #[error("invalid results table at line {line}: {reason}")]
    Table { line: usize, reason: String },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
