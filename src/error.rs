//! Error types for the simulator
//!
//! Every fatal condition ends the whole run. `Aborted` is what healthy
//! workers see when another worker gave up; the engine reports the
//! originating error in preference to it.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    /// File could not be opened, read, created or written
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Token in the particle table is not a number
    #[error("particle table: record {record}, field {field}: cannot parse {token:?}")]
    Parse {
        record: usize,
        field: usize,
        token: String,
    },

    /// Input ended before `expected` complete records were read
    #[error("particle table: expected {expected} records, found {found}")]
    MissingRecords { expected: usize, found: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("worker count must be at least 1")]
    InvalidWorkerCount,

    /// Collective exchange abandoned because a worker failed
    #[error("run aborted by worker {by}")]
    Aborted { by: usize },

    #[error("worker {rank} panicked")]
    WorkerPanicked { rank: usize },

    #[error("scenario file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl SimError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SimError::Io { path: path.into(), source }
    }

    pub fn is_abort(&self) -> bool {
        matches!(self, SimError::Aborted { .. })
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
