//! Named worker threads whose results come back through their join handle.

use std::thread;

use crate::error::{Result, SimError};

/// A running named thread that will yield a `Result<R>`.
pub struct Worker<R> {
    name: String,
    handle: thread::JoinHandle<Result<R>>,
}

/// Spawn a named thread running `body`.
pub fn spawn<R, F>(name: String, body: F) -> Result<Worker<R>>
where
    R: Send + 'static,
    F: FnOnce() -> Result<R> + Send + 'static,
{
    let handle = thread::Builder::new()
        .name(name.clone())
        .spawn(body)
        .map_err(|source| SimError::Spawn {
            role: name.clone(),
            source,
        })?;
    Ok(Worker { name, handle })
}

impl<R> Worker<R> {
    /// Thread name given at spawn.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wait for the thread; a panic becomes [`SimError::WorkerPanicked`].
    pub fn join(self) -> Result<R> {
        let name = self.name;
        self.handle
            .join()
            .map_err(|_| SimError::WorkerPanicked { worker: name })?
    }
}

/// Join every worker even if some fail, returning the successes or the first
/// error.
pub fn join_all<R>(workers: Vec<Worker<R>>) -> Result<Vec<R>> {
    let mut reports = Vec::with_capacity(workers.len());
    let mut first_err = None;
    for worker in workers {
        let name = worker.name().to_string();
        match worker.join() {
            Ok(report) => reports.push(report),
            Err(err) => {
                tracing::error!(worker = %name, error = %err, "worker failed");
                first_err.get_or_insert(err);
            }
        }
    }
    match first_err {
        Some(err) => Err(err),
        None => Ok(reports),
    }
}
