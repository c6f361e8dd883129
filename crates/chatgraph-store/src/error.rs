use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
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

    #[error("group directory not found: {0}")]
    GroupNotFound(PathBuf),

    #[error("{file}: missing required column `{column}`")]
    MissingColumn { file: PathBuf, column: &'static str },

    #[error("{file}:{line}: bad `{column}` value: {reason}")]
    MalformedRow {
        file: PathBuf,
        line: u64,
        column: &'static str,
        reason: String,
    },

    #[error("header of {legacy} does not match {target}")]
    HeaderMismatch { legacy: PathBuf, target: PathBuf },
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        StoreError::Csv {
            path: path.into(),
            source,
        }
    }
}
