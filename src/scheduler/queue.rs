//! Tick queue implementations.

use super::Scheduler;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::fmt;

/// Unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send>;

/// FIFO queue of deferred tasks drained explicitly by [`tick`](Self::tick).
///
/// Clones share the same queue, so a clone can be handed to a store as its
/// scheduler while the host keeps another to drive ticks.
#[derive(Clone)]
pub struct TickQueue {
    sender: Sender<Task>,
    receiver: Receiver<Task>,
}

impl TickQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// Run queued tasks in FIFO order until the queue is empty, including
    /// tasks queued by the tasks themselves. Returns how many tasks ran.
    ///
    /// A panicking task unwinds out of `tick`; tasks still queued stay queued
    /// for the next call.
    pub fn tick(&self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.receiver.try_recv() {
            task();
            ran += 1;
        }
        if ran > 0 {
            tracing::trace!(tasks = ran, "tick drained");
        }
        ran
    }

    /// Number of tasks waiting for the next tick.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// True if no task is waiting.
    pub fn is_idle(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl Default for TickQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TickQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickQueue")
            .field("pending", &self.pending())
            .finish()
    }
}

impl Scheduler for TickQueue {
    fn schedule(&self, task: Task) {
        // The queue holds its own receiver, so the channel cannot disconnect.
        let _ = self.sender.send(task);
    }
}

thread_local! {
    static LOCAL_QUEUE: TickQueue = TickQueue::new();
}

/// Scheduler that queues onto the calling thread's local [`TickQueue`].
///
/// Tasks run when that same thread calls [`run_pending`]. Tasks still queued
/// when the thread exits, or scheduled while it is being torn down, are
/// dropped. Stores built without a scheduler use [`CurrentThread::queue`] of
/// the building thread instead, so their flushes do not follow the writer.
#[derive(Clone, Copy, Debug, Default)]
pub struct CurrentThread;

impl CurrentThread {
    /// The calling thread's queue, shared rather than copied. None while the
    /// thread is being torn down.
    pub fn queue() -> Option<TickQueue> {
        LOCAL_QUEUE.try_with(TickQueue::clone).ok()
    }
}

impl Scheduler for CurrentThread {
    fn schedule(&self, task: Task) {
        if LOCAL_QUEUE.try_with(|queue| queue.schedule(task)).is_err() {
            tracing::trace!("thread-local tick queue gone, dropping task");
        }
    }
}

/// Run one tick of the current thread's queue. Returns how many tasks ran.
pub fn run_pending() -> usize {
    match LOCAL_QUEUE.try_with(|queue| queue.clone()) {
        Ok(queue) => queue.tick(),
        Err(_) => 0,
    }
}

/// Number of tasks waiting on the current thread's queue.
pub fn pending_tasks() -> usize {
    LOCAL_QUEUE.try_with(|queue| queue.pending()).unwrap_or(0)
}
