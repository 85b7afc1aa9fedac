//! Ingestion error types

use std::path::{Path, PathBuf};

use contracts::ContractError;
use thiserror::Error;

/// Ingestion error
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Shared taxonomy (sync violation, unknown version, unsupported extension, ...)
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// File could not be read or written
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Delimited file could not be tokenized
    #[error("csv error in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Row with the wrong column count or an unparsable field
    #[error("{}:{line}: {message}", path.display())]
    MalformedRow {
        path: PathBuf,
        line: u64,
        message: String,
    },

    /// Scan file whose size or content does not form whole rows
    #[error("malformed scan {}: {message}", path.display())]
    MalformedScan { path: PathBuf, message: String },
}

impl IngestionError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn csv(path: &Path, source: csv::Error) -> Self {
        Self::Csv {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn malformed_row(path: &Path, line: u64, message: impl Into<String>) -> Self {
        Self::MalformedRow {
            path: path.to_path_buf(),
            line,
            message: message.into(),
        }
    }

    pub(crate) fn malformed_scan(path: &Path, message: impl Into<String>) -> Self {
        Self::MalformedScan {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

/// Ingestion Result alias
pub type Result<T> = std::result::Result<T, IngestionError>;
