//! Error types for amsd-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors that stop a run
///
/// Recoverable findings (bad coordinates, unmatched media, ...) are not
/// errors; they are reported as [`crate::Diagnostic`]s.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV parsing or writing error from the csv crate
    #[error("CSV error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A row does not have the column count the field schema expects
    #[error("column count mismatch on line {line}: expected {expected} columns, found {found}")]
    SchemaMismatch {
        line: u64,
        expected: usize,
        found: usize,
    },

    /// The input has no header line
    #[error("input is empty, expected a header line")]
    EmptyInput,

    /// The field schema definition is inconsistent
    #[error("invalid field schema: {0}")]
    InvalidSchema(String),

    /// A split or extraction pattern failed to compile
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Directory traversal error
    #[error("failed to traverse directory: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
