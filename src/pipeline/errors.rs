// src/pipeline/errors.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! First-error aggregation across stages, workers and sinks

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::cancel::CancelToken;
use crate::error::{GenError, Result};

/// Collects errors from any thread and keeps the first one
///
/// Reporting a real error cancels the run token. `GenError::Cancelled` is
/// only a consequence of an earlier failure and never becomes the result.
#[derive(Debug, Clone)]
pub struct ErrorCollector {
    tx: Sender<GenError>,
    rx: Receiver<GenError>,
    cancel: CancelToken,
}

impl ErrorCollector {
    pub fn new(cancel: CancelToken) -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx, cancel }
    }

    pub fn report(&self, err: GenError) {
        if matches!(err, GenError::Cancelled) {
            tracing::trace!("Stage stopped after cancellation");
            return;
        }
        tracing::error!("{}", err);
        self.cancel.cancel();
        // Both ends live in self, so the send cannot fail
        let _ = self.tx.send(err);
    }

    /// Report the error side of `result`, passing the value through
    pub fn check<T>(&self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.report(err);
                None
            }
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.rx.is_empty()
    }

    /// Drain everything reported so far: first error wins, the rest are logged
    pub fn finish(self) -> Result<()> {
        let mut errors = self.rx.try_iter();
        let first = errors.next();
        let rest: Vec<GenError> = errors.collect();
        if !rest.is_empty() {
            tracing::warn!("{} further error(s) after the first failure", rest.len());
            for err in &rest {
                tracing::warn!("  {}", err);
            }
        }
        match first {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
