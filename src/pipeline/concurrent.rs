//! Running several runnables at once.
//!
//! Both composites start one OS thread per member, block until every member
//! has finished, then report the first failure in declaration order. There is
//! no cancellation: a failing member does not stop its siblings, so members
//! should communicate only through [`Queue`](crate::pipeline::queue::Queue)s
//! and bound their own work (bounded sources, queue timeouts).
//!
//! - [`MultiThread`] borrows its members and runs them on scoped threads, so
//!   members may hold references into the caller's stack.
//! - [`MultiProcess`] owns its members and moves each one onto an isolated
//!   worker for the duration of the run. A panicking member is contained and
//!   reported as [`PipelineError::WorkerPanicked`].

use crate::error::{PipelineError, Result};
use crate::pipeline::runnable::Runnable;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

/// Runs borrowed runnables on scoped threads sharing the caller's memory.
pub struct MultiThread<'a> {
    runnables: Vec<Box<dyn Runnable + 'a>>,
}

impl<'a> MultiThread<'a> {
    pub fn new(runnables: Vec<Box<dyn Runnable + 'a>>) -> Self {
        Self { runnables }
    }

    pub fn len(&self) -> usize {
        self.runnables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runnables.is_empty()
    }
}

impl Runnable for MultiThread<'_> {
    fn run(&mut self) -> Result<()> {
        tracing::debug!(workers = self.runnables.len(), "Starting threads");
        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(self.runnables.len());
            let mut spawn_error = None;
            for (index, runnable) in self.runnables.iter_mut().enumerate() {
                let worker = worker_name(runnable.name(), index);
                let spawned = thread::Builder::new()
                    .name(worker.clone())
                    .spawn_scoped(scope, move || runnable.run());
                match spawned {
                    Ok(handle) => handles.push((worker, handle)),
                    Err(e) => {
                        tracing::error!(worker, error = %e, "Failed to spawn thread");
                        spawn_error = Some(PipelineError::WorkerSpawn(e));
                        break;
                    }
                }
            }

            let results = handles.into_iter().map(|(worker, handle)| {
                let result = handle.join().unwrap_or_else(|payload| {
                    Err(PipelineError::WorkerPanicked {
                        worker: worker.clone(),
                        message: panic_message(payload.as_ref()),
                    })
                });
                (worker, result)
            });
            let first_failure = first_error(results);
            match spawn_error {
                Some(e) => Err(e),
                None => first_failure,
            }
        })
    }
}

/// Runs owned runnables on isolated worker threads.
///
/// Each member is handed to its worker for the whole run and comes back when
/// the worker is joined, so the composite can be run again.
pub struct MultiProcess {
    runnables: Vec<Box<dyn Runnable>>,
}

impl MultiProcess {
    pub fn new(runnables: Vec<Box<dyn Runnable>>) -> Self {
        Self { runnables }
    }

    pub fn len(&self) -> usize {
        self.runnables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runnables.is_empty()
    }
}

type Worker = thread::JoinHandle<(Box<dyn Runnable>, Result<()>)>;

impl Runnable for MultiProcess {
    fn run(&mut self) -> Result<()> {
        tracing::debug!(workers = self.runnables.len(), "Starting workers");
        let mut pending = std::mem::take(&mut self.runnables).into_iter().enumerate();
        let mut workers: Vec<(String, Worker)> = Vec::new();
        let mut spawn_error = None;

        for (index, runnable) in pending.by_ref() {
            let worker = worker_name(runnable.name(), index);
            let spawned = thread::Builder::new()
                .name(worker.clone())
                .spawn(move || isolate(runnable));
            match spawned {
                Ok(handle) => workers.push((worker, handle)),
                Err(e) => {
                    tracing::error!(worker, error = %e, "Failed to spawn worker");
                    spawn_error = Some(PipelineError::WorkerSpawn(e));
                    break;
                }
            }
        }
        // A failed spawn drops the runnable it was given; the rest are kept.
        let unstarted: Vec<Box<dyn Runnable>> = pending.map(|(_, runnable)| runnable).collect();

        let mut results = Vec::with_capacity(workers.len());
        for (worker, handle) in workers {
            let result = match handle.join() {
                Ok((runnable, result)) => {
                    self.runnables.push(runnable);
                    result
                }
                Err(payload) => Err(PipelineError::WorkerPanicked {
                    worker: worker.clone(),
                    message: panic_message(payload.as_ref()),
                }),
            };
            results.push((worker, result));
        }
        self.runnables.extend(unstarted);

        let first_failure = first_error(results);
        match spawn_error {
            Some(e) => Err(e),
            None => first_failure,
        }
    }
}

/// Run `runnable` with its panic turned into an error, handing it back either way.
fn isolate(mut runnable: Box<dyn Runnable>) -> (Box<dyn Runnable>, Result<()>) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| runnable.run()));
    let result = outcome.unwrap_or_else(|payload| {
        Err(PipelineError::WorkerPanicked {
            worker: thread::current().name().unwrap_or("worker").to_string(),
            message: panic_message(payload.as_ref()),
        })
    });
    (runnable, result)
}

fn worker_name(name: &str, index: usize) -> String {
    format!("{name}-{index}")
}

fn first_error(results: impl IntoIterator<Item = (String, Result<()>)>) -> Result<()> {
    let mut first = None;
    for (worker, result) in results {
        match result {
            Ok(()) => tracing::debug!(worker, "Worker finished"),
            Err(e) => {
                tracing::error!(worker, error = %e, "Worker failed");
                first.get_or_insert(e);
            }
        }
    }
    first.map_or(Ok(()), Err)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
