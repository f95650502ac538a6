/*
 * export.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Background worker that runs export chains one at a time.
 */

//! Export worker.
//!
//! Exports run off the calling thread on a single named worker. The queue
//! holds one pending export: while one export runs and another waits,
//! [`ExportWorker::submit`] blocks and [`ExportWorker::try_submit`] fails
//! with [`ExportError::Busy`].
//!
//! ```ignore
//! let worker = ExportWorker::new(notifier)?;
//! let handle = worker.submit("book.pdf", move || Ok(chain.apply(text)))?;
//! let output = handle.wait()?;
//! worker.shutdown()?;
//! ```

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::thread::JoinHandle;

use thiserror::Error;

use crate::error::QuillError;
use crate::processor::Output;
use crate::status::StatusNotifier;

const WORKER_NAME: &str = "quill-export";

/// Pending exports beyond the one running.
const QUEUE_SLOTS: usize = 1;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to start export worker: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("An export is already queued")]
    Busy,

    #[error("Export worker has stopped")]
    Closed,

    #[error("Export worker panicked")]
    Panicked,
}

type Job = Box<dyn FnOnce() -> Result<Output, QuillError> + Send>;

struct Task {
    name: String,
    job: Job,
    reply: SyncSender<Result<Output, QuillError>>,
}

/// Receives the result of one submitted export.
#[derive(Debug)]
pub struct ExportHandle {
    name: String,
    result: Receiver<Result<Output, QuillError>>,
}

impl ExportHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Block until the export finishes.
    pub fn wait(self) -> Result<Output, QuillError> {
        self.result
            .recv()
            .map_err(|_| QuillError::from(ExportError::Panicked))?
    }
}

/// Single background thread with a single-slot queue.
pub struct ExportWorker {
    sender: Option<SyncSender<Task>>,
    thread: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for ExportWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportWorker")
            .field("running", &self.thread.is_some())
            .finish()
    }
}

impl ExportWorker {
    /// Start the worker thread.
    ///
    /// Completion and failure of every export are reported to `notifier`.
    pub fn new(notifier: Arc<dyn StatusNotifier>) -> Result<Self, ExportError> {
        let (sender, receiver) = mpsc::sync_channel::<Task>(QUEUE_SLOTS);

        let thread = std::thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || run(receiver, notifier))
            .map_err(ExportError::Spawn)?;

        Ok(Self {
            sender: Some(sender),
            thread: Some(thread),
        })
    }

    /// Queue an export, waiting for the slot if it is taken.
    pub fn submit<F>(&self, name: impl Into<String>, job: F) -> Result<ExportHandle, ExportError>
    where
        F: FnOnce() -> Result<Output, QuillError> + Send + 'static,
    {
        let (task, handle) = task(name.into(), Box::new(job));
        self.sender()?.send(task).map_err(|_| ExportError::Closed)?;
        Ok(handle)
    }

    /// Queue an export unless the slot is taken.
    pub fn try_submit<F>(
        &self,
        name: impl Into<String>,
        job: F,
    ) -> Result<ExportHandle, ExportError>
    where
        F: FnOnce() -> Result<Output, QuillError> + Send + 'static,
    {
        let (task, handle) = task(name.into(), Box::new(job));
        match self.sender()?.try_send(task) {
            Ok(()) => Ok(handle),
            Err(TrySendError::Full(_)) => Err(ExportError::Busy),
            Err(TrySendError::Disconnected(_)) => Err(ExportError::Closed),
        }
    }

    /// Finish queued exports and stop the worker.
    pub fn shutdown(mut self) -> Result<(), ExportError> {
        self.stop()
    }

    fn sender(&self) -> Result<&SyncSender<Task>, ExportError> {
        self.sender.as_ref().ok_or(ExportError::Closed)
    }

    fn stop(&mut self) -> Result<(), ExportError> {
        self.sender.take();
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| ExportError::Panicked),
            None => Ok(()),
        }
    }
}

impl Drop for ExportWorker {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::error!(error = %e, "Export worker did not stop cleanly");
        }
    }
}

fn task(name: String, job: Job) -> (Task, ExportHandle) {
    let (reply, result) = mpsc::sync_channel(1);
    let handle = ExportHandle {
        name: name.clone(),
        result,
    };
    (Task { name, job, reply }, handle)
}

fn run(receiver: Receiver<Task>, notifier: Arc<dyn StatusNotifier>) {
    for Task { name, job, reply } in receiver {
        tracing::debug!(export = %name, "Starting export");
        let result = job();
        match &result {
            Ok(Output::Written(path)) => {
                tracing::info!(export = %name, path = %path.display(), "Export complete");
                notifier.info(&format!("Exported {name} to {}", path.display()));
            }
            Ok(Output::Text(_)) => {
                tracing::info!(export = %name, "Export complete");
                notifier.info(&format!("Exported {name}"));
            }
            Err(e) => {
                tracing::error!(export = %name, error = %e, "Export failed");
                notifier.error(&format!("Export of {name} failed: {e}"));
            }
        }
        // The caller may have dropped its handle.
        let _ = reply.send(result);
    }
    tracing::debug!("Export worker stopped");
}
