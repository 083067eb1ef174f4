use std::path::PathBuf;

use thiserror::Error;

use crate::models::ChunkRange;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Worker failed on chunk {range}: {source}")]
    WorkerFailure {
        range: ChunkRange,
        #[source]
        source: std::io::Error,
    },

    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    #[error("Failed to write report to {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProcessingError {
    pub fn worker(range: ChunkRange, source: std::io::Error) -> Self {
        ProcessingError::WorkerFailure { range, source }
    }

    pub fn output(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProcessingError::OutputWrite {
            path: path.into(),
            source,
        }
    }
}
