//! Logging middleware: reports every state change as a (prev, next) pair.

use super::Middleware;
use crate::error::Result;
use crate::store::Store;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Destination for change records.
pub trait LogSink<S>: Send + Sync {
    fn log(&self, label: &str, prev: &S, next: &S);
}

/// Default sink: one `tracing` event per change at INFO level.
///
/// ```text
/// INFO microstore::middleware::logger: state changed label="store" prev=Counter { count: 0 } next=Counter { count: 1 }
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl<S: fmt::Debug> LogSink<S> for TracingSink {
    fn log(&self, label: &str, prev: &S, next: &S) {
        tracing::info!(label, prev = ?prev, next = ?next, "state changed");
    }
}

/// Observes the store and emits `{prev, next}` to a [`LogSink`] after every
/// notification. Never mutates state and never replaces the store.
pub struct LoggerMiddleware<S> {
    label: String,
    sink: Arc<dyn LogSink<S>>,
}

impl<S: fmt::Debug + 'static> LoggerMiddleware<S> {
    /// Log through [`TracingSink`] under `label`.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            sink: Arc::new(TracingSink),
        }
    }
}

impl<S: fmt::Debug + 'static> Default for LoggerMiddleware<S> {
    fn default() -> Self {
        Self::new("store")
    }
}

impl<S> LoggerMiddleware<S> {
    /// Send records to `sink` instead.
    pub fn with_sink(mut self, sink: impl LogSink<S> + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl<S, A> Middleware<S, A> for LoggerMiddleware<S>
where
    S: Send + Sync + 'static,
    A: 'static,
{
    fn apply(&self, store: &Store<S, A>) -> Result<Option<Store<S, A>>> {
        let prev = Mutex::new(store.get_state());
        let label = self.label.clone();
        let sink = Arc::clone(&self.sink);
        let weak = store.downgrade();

        store.subscribe_to_state(move || {
            let Some(store) = weak.upgrade() else {
                return;
            };
            let next = store.get_state();
            let prev = std::mem::replace(&mut *prev.lock(), Arc::clone(&next));
            sink.log(&label, &prev, &next);
        });

        Ok(None)
    }

    fn name(&self) -> &str {
        "logger"
    }
}
