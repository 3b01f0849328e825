use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or augmenting a [`Trace`](super::model::Trace).
///
/// Per-cell parse failures never show up here: they only cause the record
/// to be dropped during cleaning.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed delimited table: {0}")]
    Csv(#[from] csv::Error),

    #[error("schema mismatch: expected at least {expected} columns, found {actual}")]
    Schema { expected: usize, actual: usize },

    #[error("channel '{0}' appears more than once")]
    DuplicateChannel(String),

    #[error("trace has no '{0}' channel")]
    MissingChannel(String),

    #[error("channel '{channel}' has {actual} samples, trace has {expected}")]
    LengthMismatch {
        channel: String,
        expected: usize,
        actual: usize,
    },

    #[error("need at least {needed} samples, got {actual}")]
    InsufficientSamples { needed: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, TraceError>;
