// src/pipeline/graph.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dependency-ordered stage execution
//!
//! Stages are named closures with declared predecessors. The graph is checked
//! before anything runs (duplicate names, unknown dependencies, cycles), then
//! every stage whose predecessors all completed is started on its own scoped
//! thread. Stages may borrow from the caller's stack, which is how sealed
//! dimensions are handed from one stage to the next.
//!
//! After a failure nothing new is started. Stages that never ran are dropped,
//! which also drops (and thereby closes) any channel senders they captured.

use std::collections::{HashMap, VecDeque};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::unbounded;

use super::cancel::CancelToken;
use super::errors::ErrorCollector;
use crate::error::{GenError, Result};

/// Work of one stage
pub type Task<'env> = Box<dyn FnOnce(&CancelToken) -> Result<()> + Send + 'env>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Completed,
    Failed,
    /// Stopped early because another stage failed
    Cancelled,
    /// Never started: a predecessor did not complete, or the run was cancelled
    Skipped,
}

#[derive(Debug, Clone)]
pub struct StageReport {
    pub name: String,
    pub status: StageStatus,
    pub elapsed: Duration,
}

struct Stage<'env> {
    name: String,
    deps: Vec<String>,
    task: Option<Task<'env>>,
}

/// Stages plus their dependency edges
#[derive(Default)]
pub struct TaskGraph<'env> {
    stages: Vec<Stage<'env>>,
}

/// Adjacency derived from a validated graph
struct Plan {
    successors: Vec<Vec<usize>>,
    pending: Vec<usize>,
}

impl<'env> TaskGraph<'env> {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Add stage `name`, runnable once every stage in `deps` completed
    pub fn add<F>(&mut self, name: &str, deps: &[&str], task: F) -> &mut Self
    where
        F: FnOnce(&CancelToken) -> Result<()> + Send + 'env,
    {
        self.stages.push(Stage {
            name: name.to_string(),
            deps: deps.iter().map(|d| d.to_string()).collect(),
            task: Some(Box::new(task)),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Check names and edges, returning a topological order
    pub fn validate(&self) -> Result<Vec<String>> {
        let plan = self.plan()?;
        let mut pending = plan.pending.clone();
        let mut queue: VecDeque<usize> = (0..self.stages.len())
            .filter(|&i| pending[i] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.stages.len());

        while let Some(i) = queue.pop_front() {
            order.push(self.stages[i].name.clone());
            for &next in &plan.successors[i] {
                pending[next] -= 1;
                if pending[next] == 0 {
                    queue.push_back(next);
                }
            }
        }

        if order.len() != self.stages.len() {
            let stuck: Vec<&str> = (0..self.stages.len())
                .filter(|&i| pending[i] > 0)
                .map(|i| self.stages[i].name.as_str())
                .collect();
            return Err(GenError::config(format!(
                "dependency cycle among stages: {}",
                stuck.join(", ")
            )));
        }
        Ok(order)
    }

    fn plan(&self) -> Result<Plan> {
        let mut index = HashMap::with_capacity(self.stages.len());
        for (i, stage) in self.stages.iter().enumerate() {
            if index.insert(stage.name.as_str(), i).is_some() {
                return Err(GenError::config(format!("duplicate stage {}", stage.name)));
            }
        }

        let mut successors = vec![Vec::new(); self.stages.len()];
        let mut pending = vec![0; self.stages.len()];
        for (i, stage) in self.stages.iter().enumerate() {
            for dep in &stage.deps {
                let &d = index.get(dep.as_str()).ok_or_else(|| {
                    GenError::config(format!("stage {} depends on unknown stage {}", stage.name, dep))
                })?;
                successors[d].push(i);
                pending[i] += 1;
            }
        }
        Ok(Plan {
            successors,
            pending,
        })
    }

    /// Run every stage in dependency order
    ///
    /// Only an invalid graph is returned as an error, before any stage starts.
    /// Stage failures go to `errors`, which cancels `cancel`.
    pub fn run(mut self, cancel: &CancelToken, errors: &ErrorCollector) -> Result<Vec<StageReport>> {
        self.validate()?;
        let Plan {
            successors,
            mut pending,
        } = self.plan()?;

        let n = self.stages.len();
        let mut status: Vec<Option<StageStatus>> = vec![None; n];
        let mut elapsed = vec![Duration::ZERO; n];
        let (done_tx, done_rx) = unbounded::<(usize, Result<()>, Duration)>();

        thread::scope(|scope| {
            let mut ready: Vec<usize> = (0..n).filter(|&i| pending[i] == 0).collect();
            let mut running = 0usize;

            loop {
                while let Some(i) = ready.pop() {
                    let stage = &mut self.stages[i];
                    let Some(task) = stage.task.take() else {
                        continue;
                    };
                    if cancel.is_cancelled() {
                        tracing::debug!("Not starting stage {} after cancellation", stage.name);
                        continue;
                    }

                    let name = stage.name.clone();
                    let done = done_tx.clone();
                    let token = cancel.clone();
                    let spawned = thread::Builder::new()
                        .name(format!("stage-{name}"))
                        .spawn_scoped(scope, move || {
                            tracing::debug!("Stage {} started", name);
                            let start = Instant::now();
                            let result = catch_unwind(AssertUnwindSafe(|| task(&token)))
                                .unwrap_or_else(|_| {
                                    Err(GenError::Panicked {
                                        thread: format!("stage-{name}"),
                                    })
                                });
                            let _ = done.send((i, result, start.elapsed()));
                        });
                    match spawned {
                        Ok(_) => running += 1,
                        Err(source) => {
                            status[i] = Some(StageStatus::Failed);
                            errors.report(GenError::Spawn {
                                name: format!("stage-{}", self.stages[i].name),
                                source,
                            });
                        }
                    }
                }

                if running == 0 {
                    break;
                }
                // done_tx lives in this scope, so recv only fails if every stage is gone
                let Ok((i, result, took)) = done_rx.recv() else {
                    break;
                };
                running -= 1;
                elapsed[i] = took;

                match result {
                    Ok(()) => {
                        tracing::info!(
                            "Stage {} completed in {:.2?}",
                            self.stages[i].name,
                            took
                        );
                        status[i] = Some(StageStatus::Completed);
                        for &next in &successors[i] {
                            pending[next] -= 1;
                            if pending[next] == 0 {
                                ready.push(next);
                            }
                        }
                    }
                    Err(GenError::Cancelled) => {
                        status[i] = Some(StageStatus::Cancelled);
                    }
                    Err(err) => {
                        status[i] = Some(StageStatus::Failed);
                        tracing::debug!("Stage {} failed", self.stages[i].name);
                        errors.report(err);
                    }
                }
            }
        });

        let reports = self
            .stages
            .into_iter()
            .zip(status)
            .zip(elapsed)
            .map(|((stage, status), elapsed)| {
                let status = status.unwrap_or(StageStatus::Skipped);
                if status == StageStatus::Skipped {
                    tracing::warn!("Stage {} skipped", stage.name);
                }
                StageReport {
                    name: stage.name,
                    status,
                    elapsed,
                }
            })
            .collect();
        Ok(reports)
    }
}
