//! The worker pool and its producer handle.

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use crate::errors::QueueError;

/// How long an idle worker sleeps before re-checking the queue state.
const IDLE_WAIT: Duration = Duration::from_millis(50);

type Task = Box<dyn FnOnce() -> anyhow::Result<()> + Send + 'static>;

struct State {
    tasks: VecDeque<Task>,
    /// Enqueued tasks not yet finished, running ones included.
    pending: usize,
    running: bool,
    shutdown: bool,
    fault: Option<Arc<anyhow::Error>>,
}

struct Shared {
    state: Mutex<State>,
    /// Signalled when a task is enqueued or the queue stops.
    task_ready: Condvar,
    /// Signalled when `pending` drops to zero.
    drained: Condvar,
}

impl Shared {
    fn enqueue(&self, task: Task) -> bool {
        let mut state = self.state.lock();
        if !state.running {
            return false;
        }
        state.tasks.push_back(task);
        state.pending += 1;
        drop(state);
        let _ = self.task_ready.notify_one();
        true
    }

    fn next_task(&self) -> Option<Task> {
        let mut state = self.state.lock();
        loop {
            if state.shutdown || !state.running {
                return None;
            }
            if let Some(task) = state.tasks.pop_front() {
                return Some(task);
            }
            let _ = self.task_ready.wait_for(&mut state, IDLE_WAIT);
        }
    }

    /// Release the pending slot of a finished task, recording its fault.
    fn complete(&self, fault: Option<anyhow::Error>) {
        let discarded = {
            let mut state = self.state.lock();
            let discarded = match fault {
                Some(error) => {
                    if state.fault.is_none() {
                        warn!(error = %error, "task failed, stopping queue");
                        state.fault = Some(Arc::new(error));
                    } else {
                        debug!(error = %error, "further task failure after fault");
                    }
                    Self::stop_locked(&mut state)
                }
                None => VecDeque::new(),
            };
            state.pending -= 1;
            if state.pending == 0 {
                let _ = self.drained.notify_all();
            }
            discarded
        };
        let _ = self.task_ready.notify_all();
        drop(discarded);
    }

    /// Stop accepting work and take every task not yet started.
    fn stop_locked(state: &mut State) -> VecDeque<Task> {
        state.running = false;
        let discarded = std::mem::take(&mut state.tasks);
        state.pending -= discarded.len();
        if !discarded.is_empty() {
            debug!(discarded = discarded.len(), "discarding queued tasks");
        }
        discarded
    }

    fn stop(&self) {
        let discarded = {
            let mut state = self.state.lock();
            let discarded = Self::stop_locked(&mut state);
            if state.pending == 0 {
                let _ = self.drained.notify_all();
            }
            discarded
        };
        let _ = self.task_ready.notify_all();
        drop(discarded);
    }
}

fn work(shared: &Shared) {
    while let Some(task) = shared.next_task() {
        let fault = match panic::catch_unwind(AssertUnwindSafe(task)) {
            Ok(Ok(())) => None,
            Ok(Err(error)) => Some(error),
            Err(payload) => Some(anyhow::Error::new(QueueError::Panicked(panic_message(
                payload.as_ref(),
            )))),
        };
        shared.complete(fault);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

/// A cloneable producer for a [`WorkerQueue`], for use inside tasks.
#[derive(Clone)]
pub struct QueueHandle {
    shared: Arc<Shared>,
}

impl QueueHandle {
    /// Append a task. Returns `false` (and drops the task) if the queue
    /// has stopped.
    pub fn enqueue<F>(&self, task: F) -> bool
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        self.shared.enqueue(Box::new(task))
    }

    /// Append `work`; when it succeeds, pass its output to `callback` on
    /// the same worker.
    pub fn enqueue_with_callback<T, F, C>(&self, work: F, callback: C) -> bool
    where
        F: FnOnce() -> anyhow::Result<T> + Send + 'static,
        C: FnOnce(T) + Send + 'static,
    {
        self.enqueue(move || {
            callback(work()?);
            Ok(())
        })
    }

    /// Whether the queue still accepts tasks.
    pub fn is_running(&self) -> bool {
        self.shared.state.lock().running
    }
}

impl fmt::Debug for QueueHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueHandle")
            .field("running", &self.is_running())
            .finish()
    }
}

/// A fixed pool of worker threads over a shared FIFO of tasks.
pub struct WorkerQueue {
    handle: QueueHandle,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerQueue {
    /// Start `threads` workers (at least one).
    pub fn new(threads: usize) -> Result<Self, QueueError> {
        let threads = threads.max(1);
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                tasks: VecDeque::new(),
                pending: 0,
                running: true,
                shutdown: false,
                fault: None,
            }),
            task_ready: Condvar::new(),
            drained: Condvar::new(),
        });

        let mut queue = Self {
            handle: QueueHandle {
                shared: Arc::clone(&shared),
            },
            workers: Vec::with_capacity(threads),
        };
        for index in 0..threads {
            let shared = Arc::clone(&shared);
            let worker = thread::Builder::new()
                .name(format!("racing-worker-{index}"))
                .spawn(move || work(&shared))?;
            queue.workers.push(worker);
        }
        debug!(threads, "worker queue started");
        Ok(queue)
    }

    /// A producer handle sharing this queue.
    pub fn handle(&self) -> QueueHandle {
        self.handle.clone()
    }

    /// See [`QueueHandle::enqueue`].
    pub fn enqueue<F>(&self, task: F) -> bool
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        self.handle.enqueue(task)
    }

    /// See [`QueueHandle::enqueue_with_callback`].
    pub fn enqueue_with_callback<T, F, C>(&self, work: F, callback: C) -> bool
    where
        F: FnOnce() -> anyhow::Result<T> + Send + 'static,
        C: FnOnce(T) + Send + 'static,
    {
        self.handle.enqueue_with_callback(work, callback)
    }

    /// Block until every enqueued task, and every task those enqueued,
    /// has finished or been discarded.
    ///
    /// Must not be called from inside a task of this queue.
    pub fn join(&self) {
        let shared = &self.handle.shared;
        let mut state = shared.state.lock();
        while state.pending > 0 {
            shared.drained.wait(&mut state);
        }
    }

    /// Stop accepting tasks and discard those not yet started. Running
    /// tasks finish normally.
    pub fn stop(&self) {
        self.handle.shared.stop();
    }

    /// The first captured task error or panic.
    pub fn fault(&self) -> Option<Arc<anyhow::Error>> {
        self.handle.shared.state.lock().fault.clone()
    }

    /// Whether the queue still accepts tasks.
    pub fn is_running(&self) -> bool {
        self.handle.is_running()
    }

    /// Tasks enqueued but not yet finished.
    pub fn pending(&self) -> usize {
        self.handle.shared.state.lock().pending
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.workers.len()
    }
}

impl fmt::Debug for WorkerQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.handle.shared.state.lock();
        f.debug_struct("WorkerQueue")
            .field("threads", &self.workers.len())
            .field("running", &state.running)
            .field("pending", &state.pending)
            .field("faulted", &state.fault.is_some())
            .finish()
    }
}

impl Drop for WorkerQueue {
    fn drop(&mut self) {
        let shared = &self.handle.shared;
        let discarded = {
            let mut state = shared.state.lock();
            state.shutdown = true;
            let discarded = Shared::stop_locked(&mut state);
            if state.pending == 0 {
                let _ = shared.drained.notify_all();
            }
            discarded
        };
        let _ = shared.task_ready.notify_all();
        drop(discarded);
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                warn!("worker thread panicked outside a task");
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
