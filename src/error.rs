// src/error.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error type shared by samplers, workers, sinks and the pipeline coordinator

use std::io;
use std::path::PathBuf;

/// Errors raised while planning or running a generation pipeline
#[derive(Debug, thiserror::Error)]
pub enum GenError {
    /// Invalid input detected before any thread starts
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A data-model invariant does not hold (e.g. customer without addresses)
    #[error("consistency violation: {0}")]
    Consistency(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("CSV encoding failed for table {table}: {source}")]
    Csv {
        table: String,
        #[source]
        source: csv::Error,
    },

    #[error("JSON encoding failed for table {table}: {source}")]
    Json {
        table: String,
        #[source]
        source: serde_json::Error,
    },

    /// The consumer side of a table channel went away mid-run
    #[error("channel for table {table} closed while producing")]
    ChannelClosed { table: String },

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to spawn thread {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("thread {thread} panicked")]
    Panicked { thread: String },

    /// Work stopped because a sibling failed first
    #[error("cancelled after an earlier failure")]
    Cancelled,
}

impl GenError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        GenError::Config(msg.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        GenError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = GenError> = std::result::Result<T, E>;
