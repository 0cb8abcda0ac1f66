//! Error types for reading and writing records.

use crate::codec::ScalarKind;
use std::path::PathBuf;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while resolving a schema, writing records, or reading them back.
///
/// Every variant is terminal for the call that produced it. Row-level variants carry
/// the 1-based physical line of the source file (the header is line 1).
#[derive(Debug, Error)]
pub enum Error {
    /// `write` was called with no records, so no header can be derived.
    #[error("no records to write")]
    EmptyInput,

    /// A read option is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A leaf field has a type with no value codec.
    #[error("unsupported field type `{type_name}` for field `{field}`")]
    UnsupportedFieldType { field: String, type_name: &'static str },

    /// A record shape contains itself, directly or through its children.
    #[error("cyclic schema: {path}")]
    CyclicSchema { path: String },

    /// Opening, creating, or flushing a file failed.
    #[error("failed to {op} {}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The header row could not be read, or the source is empty.
    #[error("failed to read header from {}", path.display())]
    HeaderRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A data row is malformed (bad quoting, wrong field count, invalid UTF-8).
    #[error("failed to read record at line {line}")]
    RowRead {
        line: u64,
        #[source]
        source: csv::Error,
    },

    /// Writing the header (`row == 0`) or a record row failed.
    #[error("failed to write row {row}")]
    WriteRow {
        row: usize,
        #[source]
        source: csv::Error,
    },

    /// A cell could not be decoded into its field.
    #[error("failed to set field `{field}` at line {line}: cannot parse {raw:?} as {kind}: {reason}")]
    ValueParse {
        line: u64,
        field: String,
        kind: ScalarKind,
        raw: String,
        reason: String,
    },

    /// The record handler returned an error.
    #[error("handler error at line {line}")]
    Handler {
        line: u64,
        #[source]
        source: anyhow::Error,
    },

    /// A handler or record accessor panicked while processing a row.
    #[error("panic while processing line {line}: {message}")]
    Panicked { line: u64, message: String },

    /// A `Record` implementation disagrees with the shape it declares.
    #[error("record `{type_name}` does not match its shape at column `{column}`")]
    ShapeMismatch {
        type_name: &'static str,
        column: String,
    },

    /// The worker pool could not be started.
    #[error("failed to create worker pool")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// The source line this error refers to, if it is a row-level error.
    #[must_use]
    pub fn line(&self) -> Option<u64> {
        match self {
            Self::RowRead { line, .. }
            | Self::ValueParse { line, .. }
            | Self::Handler { line, .. }
            | Self::Panicked { line, .. } => Some(*line),
            _ => None,
        }
    }
}
