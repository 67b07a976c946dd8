// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, UnifyError>;

#[derive(Error, Debug)]
pub enum UnifyError {
    /// The index read lock could not be taken; nothing was generated.
    #[error("source index lock unavailable")]
    LockUnavailable,

    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A snapshot line that is not a valid translation unit record.
    #[error("bad snapshot line {line}: {source}")]
    Snapshot {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("parser setup failed: {0}")]
    Parser(String),
}

impl UnifyError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}
