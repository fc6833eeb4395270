//! Errors raised while reading, writing and staging tabular data

use std::path::PathBuf;
use thiserror::Error;

use crate::normalize::NormalizeError;

/// Failures of the storage and staging collaborators
#[derive(Debug, Error)]
pub enum StagingError {
    /// A file could not be opened, read or written
    #[error("failed to access {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A CSV stream could not be parsed or written
    #[error("CSV error in {context}: {source}")]
    Csv {
        /// What was being read or written
        context: String,
        /// Underlying error
        #[source]
        source: csv::Error,
    },

    /// A CSV stream has no header row
    #[error("{context} has no header row")]
    MissingHeader {
        /// What was being read
        context: String,
    },

    /// Rows could not be normalized
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    /// No blob is stored under the name
    #[error("blob '{name}' not found")]
    BlobNotFound {
        /// Requested blob name
        name: String,
    },

    /// Blob names must be plain relative paths
    #[error("invalid blob name '{name}'")]
    InvalidBlobName {
        /// Rejected name
        name: String,
    },

    /// No schema is known for the table
    #[error("no schema registered for table '{table}'")]
    UnknownTable {
        /// Requested table
        table: String,
    },

    /// More malformed rows than the load tolerates
    #[error("load into '{table}' rejected: {bad_records} bad records exceed the limit of {max_bad_records} (first: {first_error})")]
    ToleranceExceeded {
        /// Target table
        table: String,
        /// Malformed rows found
        bad_records: usize,
        /// Configured tolerance
        max_bad_records: usize,
        /// Description of the first bad row
        first_error: String,
    },
}

impl StagingError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Wrap a CSV error with what was being processed
    pub fn csv(context: impl Into<String>, source: csv::Error) -> Self {
        Self::Csv { context: context.into(), source }
    }
}

/// Result type for storage operations
pub type StagingResult<T> = Result<T, StagingError>;
