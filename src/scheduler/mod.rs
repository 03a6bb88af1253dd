//! Deferred execution for batched notifications.
//!
//! A batched store never notifies from inside `set_state`/`dispatch`. Instead
//! it hands a single flush task to a [`Scheduler`], and the task runs on the
//! next scheduling tick. The host decides when a tick happens:
//!
//! - By default a store keeps the [`TickQueue`] of the thread that built it
//!   ([`CurrentThread::queue`]); call [`run_pending`] from that thread, e.g.
//!   once per event-loop turn. Writes from other threads flush there too.
//! - [`CurrentThread`] itself queues onto whichever thread is writing.
//! - A shared [`TickQueue`] can be injected so several stores flush together
//!   from whichever thread calls [`TickQueue::tick`].
//!
//! # Example
//!
//! ```ignore
//! let store = create_store(AppState::default(), StoreOptions::default())?;
//! store.subscribe_to_state(|| println!("changed"));
//!
//! store.set_state(AppPatch { count: Some(1), ..Default::default() });
//! store.set_state(AppPatch { count: Some(2), ..Default::default() });
//!
//! // Prints "changed" once.
//! microstore::run_pending();
//! ```

mod queue;

pub use queue::{pending_tasks, run_pending, CurrentThread, Task, TickQueue};

/// Single-shot deferred callback primitive.
pub trait Scheduler: Send + Sync {
    /// Queue `task` to run exactly once on a later tick.
    fn schedule(&self, task: Task);
}
