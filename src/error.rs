//! Error types for survey ingestion.
//!
//! Only loading touches the filesystem, so only loading can fail. Analysis
//! stages take already-coerced records and degrade to empty results instead
//! of returning errors.

use std::path::PathBuf;
use thiserror::Error;

pub type SurveyResult<T> = Result<T, SurveyError>;

#[derive(Debug, Error)]
pub enum SurveyError {
    /// The data directory does not exist or is not a directory.
    #[error("data directory not found: {0}")]
    DataDirNotFound(PathBuf),

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("directory walk failed: {0}")]
    WalkDir(#[from] walkdir::Error),
}
