use std::path::PathBuf;

use thiserror::Error;

/// Failure to build a [`Table`](super::model::Table) from its source file.
///
/// Per-row irregularities never surface here: they are absorbed into empty
/// or absent values while loading.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: csv::Error,
    },

    #[error("{} has no header row", path.display())]
    MissingHeader { path: PathBuf },
}

/// Rejected query parameters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("invalid {param} {value:?}: {reason}")]
    BadRequest {
        param: &'static str,
        value: String,
        reason: &'static str,
    },
}
