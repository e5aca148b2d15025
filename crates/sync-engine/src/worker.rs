// crates/sync-engine/src/worker.rs
//! The single bookmark worker thread
//!
//! Every operation that touches local storage or the network runs here, one
//! at a time, in submission order. Operations receive a [`WorkerContext`],
//! which is created on the worker thread and cannot leave it.

use crate::attributes::BookmarkAttributes;
use crate::error::{SyncError, SyncResult};
use crate::events::EventBus;
use crate::status::ChangingAccounts;
use crossbeam_channel::{unbounded, Receiver, Sender};
use pagemark_network::BookmarkHttpCalls;
use std::future::Future;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::thread;
use tokio::sync::oneshot;

type Job = Box<dyn FnOnce(&mut WorkerContext) + Send>;

/// Everything operations need, shared between the worker and the service
#[derive(Clone)]
pub(crate) struct WorkerParts {
    pub http: Arc<dyn BookmarkHttpCalls>,
    pub events: EventBus,
    pub attributes: BookmarkAttributes,
    pub changing: ChangingAccounts,
}

/// State available to operations running on the worker
pub struct WorkerContext {
    pub(crate) http: Arc<dyn BookmarkHttpCalls>,
    pub(crate) events: EventBus,
    pub(crate) attributes: BookmarkAttributes,
    pub(crate) changing: ChangingAccounts,
    _not_send: PhantomData<*const ()>,
}

impl WorkerContext {
    pub(crate) fn new(parts: WorkerParts) -> Self {
        Self {
            http: parts.http,
            events: parts.events,
            attributes: parts.attributes,
            changing: parts.changing,
            _not_send: PhantomData,
        }
    }
}

/// Handle to the worker thread
pub(crate) struct Worker {
    queue: Option<WorkQueue>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Worker {
    /// Starts the worker thread
    pub fn start(parts: WorkerParts) -> SyncResult<Self> {
        let (tx, rx) = unbounded::<Job>();
        let handle = thread::Builder::new()
            .name("pagemark-bookmarks".to_string())
            .spawn(move || worker_loop(parts, rx))
            .map_err(|e| SyncError::Custom(format!("Failed to start worker: {}", e)))?;

        Ok(Self {
            queue: Some(WorkQueue { sender: tx }),
            handle: Some(handle),
        })
    }

    /// A submitter that can be moved to other threads
    pub fn queue(&self) -> Option<WorkQueue> {
        self.queue.clone()
    }

    pub fn submit<T, F>(&self, task: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut WorkerContext) -> SyncResult<T> + Send + 'static,
    {
        match &self.queue {
            Some(queue) => queue.submit(task),
            None => TaskHandle::failed(SyncError::WorkerStopped),
        }
    }

    /// Stops accepting work, runs what is queued, then joins the thread.
    ///
    /// Other [`WorkQueue`] clones must be dropped first or this blocks.
    pub fn stop(&mut self) {
        self.queue.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("bookmark worker panicked");
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(parts: WorkerParts, jobs: Receiver<Job>) {
    let mut context = WorkerContext::new(parts);
    log::debug!("bookmark worker started");

    for job in jobs.iter() {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| job(&mut context)));
        if outcome.is_err() {
            log::error!("bookmark task panicked");
        }
    }

    log::debug!("bookmark worker stopped");
}

/// Cloneable submitter for the worker's FIFO queue
#[derive(Clone)]
pub(crate) struct WorkQueue {
    sender: Sender<Job>,
}

impl WorkQueue {
    /// Enqueues a task and returns a handle to its result
    pub fn submit<T, F>(&self, task: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut WorkerContext) -> SyncResult<T> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move |context| {
            let _ = tx.send(task(context));
        });
        match self.sender.send(job) {
            Ok(()) => TaskHandle::pending(rx),
            Err(_) => TaskHandle::failed(SyncError::WorkerStopped),
        }
    }
}

/// Result of a task submitted to the worker.
///
/// Await it from async code, or call [`TaskHandle::wait`] from a plain
/// thread. A task that never runs resolves to [`SyncError::WorkerStopped`].
pub struct TaskHandle<T> {
    state: TaskState<T>,
}

enum TaskState<T> {
    Pending(oneshot::Receiver<SyncResult<T>>),
    Ready(Option<SyncResult<T>>),
}

impl<T> TaskHandle<T> {
    fn pending(rx: oneshot::Receiver<SyncResult<T>>) -> Self {
        Self {
            state: TaskState::Pending(rx),
        }
    }

    /// A handle that is already complete
    pub fn ready(result: SyncResult<T>) -> Self {
        Self {
            state: TaskState::Ready(Some(result)),
        }
    }

    /// A handle that has already failed
    pub fn failed(error: SyncError) -> Self {
        Self::ready(Err(error))
    }

    /// Blocks the calling thread until the task completes.
    ///
    /// Must not be called from inside an async runtime; await the handle
    /// there instead.
    pub fn wait(self) -> SyncResult<T> {
        match self.state {
            TaskState::Pending(rx) => rx.blocking_recv().unwrap_or(Err(SyncError::WorkerStopped)),
            TaskState::Ready(result) => result.unwrap_or(Err(SyncError::WorkerStopped)),
        }
    }
}

impl<T> Unpin for TaskHandle<T> {}

impl<T> Future for TaskHandle<T> {
    type Output = SyncResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match &mut this.state {
            TaskState::Pending(rx) => Pin::new(rx)
                .poll(cx)
                .map(|received| received.unwrap_or(Err(SyncError::WorkerStopped))),
            TaskState::Ready(result) => {
                Poll::Ready(result.take().unwrap_or(Err(SyncError::WorkerStopped)))
            }
        }
    }
}
