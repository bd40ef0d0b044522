// src/pipeline/sinks.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sink threads of a run
//!
//! Every table gets a bounded channel and a dedicated OS thread draining it
//! into a file. Sink threads start before any producer so a full channel can
//! always make progress, and they are joined only after every producer has
//! dropped its sender. A sink that fails to write cancels the run right away
//! and hands its error over in [`SinkSet::join`].

use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Sender};

use super::cancel::CancelToken;
use super::errors::ErrorCollector;
use crate::error::{GenError, Result};
use crate::records::Record;
use crate::sink::{drain_with, Chunk, ChunkSink, OutputFormat, RecordSink};

/// Rows written to one output table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReport {
    pub table: String,
    pub path: PathBuf,
    pub rows: u64,
}

struct Running {
    table: String,
    path: PathBuf,
    handle: JoinHandle<Result<u64>>,
}

/// Output tables of one run, each drained by its own thread
pub struct SinkSet {
    dir: PathBuf,
    format: OutputFormat,
    capacity: usize,
    cancel: CancelToken,
    running: Vec<Running>,
}

impl SinkSet {
    pub fn new(dir: &Path, format: OutputFormat, capacity: usize, cancel: &CancelToken) -> Self {
        Self {
            dir: dir.to_path_buf(),
            format,
            capacity: capacity.max(1),
            cancel: cancel.clone(),
            running: Vec::new(),
        }
    }

    fn path_for(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", table, self.format.extension()))
    }

    /// Start a typed record sink for `table`
    pub fn open<T>(&mut self, table: &str) -> Result<Sender<T>>
    where
        T: Record + Send + 'static,
    {
        let path = self.path_for(table);
        let sink = RecordSink::<T>::create(table, &path, self.format)?;
        let (tx, rx) = bounded(self.capacity);
        let name = table.to_string();
        let cancel = self.cancel.clone();
        self.spawn(table, path, move || {
            drain_with(&name, sink, rx, |_| cancel.cancel())
        })?;
        Ok(tx)
    }

    /// Start a sink for pre-encoded chunks of `table`
    pub fn open_chunks(&mut self, table: &str, columns: &[&str]) -> Result<Sender<Chunk>> {
        let path = self.path_for(table);
        let sink = ChunkSink::create(&path, self.format.header_line(columns))?;
        let (tx, rx) = bounded(self.capacity);
        let name = table.to_string();
        let cancel = self.cancel.clone();
        self.spawn(table, path, move || {
            drain_with(&name, sink, rx, |_| cancel.cancel())
        })?;
        Ok(tx)
    }

    fn spawn<F>(&mut self, table: &str, path: PathBuf, body: F) -> Result<()>
    where
        F: FnOnce() -> Result<u64> + Send + 'static,
    {
        let name = format!("sink-{table}");
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(body)
            .map_err(|source| GenError::Spawn { name, source })?;
        tracing::debug!("Started sink for {} -> {}", table, path.display());
        self.running.push(Running {
            table: table.to_string(),
            path,
            handle,
        });
        Ok(())
    }

    /// Wait for every sink; failures go to `errors`
    ///
    /// A sink error is reported here exactly once, the sink thread itself
    /// only cancels. Must only be called once every sender handed out has been
    /// dropped, otherwise this blocks forever.
    pub fn join(self, errors: &ErrorCollector) -> Vec<TableReport> {
        let mut reports = Vec::with_capacity(self.running.len());
        for sink in self.running {
            match sink.handle.join() {
                Ok(Ok(rows)) => {
                    tracing::info!("Wrote {} rows to {}", rows, sink.path.display());
                    reports.push(TableReport {
                        table: sink.table,
                        path: sink.path,
                        rows,
                    });
                }
                Ok(Err(err)) => errors.report(err),
                Err(_) => errors.report(GenError::Panicked {
                    thread: format!("sink-{}", sink.table),
                }),
            }
        }
        reports
    }
}

/// Send already generated dimension rows to a sink
pub(crate) fn publish<T: Clone>(
    tx: &Sender<T>,
    table: &str,
    rows: &[T],
    cancel: &CancelToken,
) -> Result<()> {
    for (i, row) in rows.iter().enumerate() {
        if i % 1024 == 0 && cancel.is_cancelled() {
            return Err(GenError::Cancelled);
        }
        tx.send(row.clone()).map_err(|_| GenError::ChannelClosed {
            table: table.to_string(),
        })?;
    }
    Ok(())
}
