// Error types shared by both extraction stages.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

// Why a completed INSERT statement could not be split into columns + VALUES blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SplitError {
    #[error("no opening parenthesis for the column list")]
    MissingOpenParen,
    #[error("column list is not closed")]
    MissingCloseParen,
    #[error("no VALUES keyword after the column list")]
    MissingValues,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Stream(#[from] io::Error),

    // Stage 2 precondition: the join has no meaningful partial result.
    #[error("Missing {kind} CSV: {}", path.display())]
    MissingCsv { kind: &'static str, path: PathBuf },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed INSERT for table {table} ending at line {line}: {reason}")]
    MalformedInsert {
        table: String,
        line: u64,
        reason: SplitError,
    },

    #[error("unbalanced VALUES blob for table {table} ending at line {line}")]
    UnbalancedValues { table: String, line: u64 },
}

impl Error {
    // Attach the offending path to an I/O failure.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
