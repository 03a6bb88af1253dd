//! Registry of whole-state listeners.

use crate::types::{Listener, ListenerId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Set of active listeners.
///
/// Registering and removing are O(1). Ids increase monotonically, so a pass
/// sorts its snapshot of ids to call listeners in registration order.
pub struct ListenerRegistry {
    /// Active listeners by ID.
    listeners: RwLock<HashMap<ListenerId, Listener>>,
    /// Counter for generating listener IDs.
    next_id: AtomicU64,
}

impl ListenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a listener. Registering the same `Arc` twice yields two
    /// independent registrations.
    pub fn subscribe(&self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.listeners.write().insert(id, listener);
        id
    }

    /// Remove a listener. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.write().remove(&id).is_some()
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    /// Run one notification pass. Returns how many listeners were invoked.
    ///
    /// The pass covers the listeners registered when it starts, in
    /// registration order. A listener removed during the pass is skipped if
    /// it has not been reached yet; listeners added during the pass wait for
    /// the next one. No lock is held while a listener runs, so listeners may
    /// subscribe, unsubscribe and mutate the store freely.
    pub fn notify_all(&self) -> usize {
        let mut ids: Vec<ListenerId> = self.listeners.read().keys().copied().collect();
        ids.sort_unstable();
        let mut invoked = 0;

        for id in ids {
            let listener = self.listeners.read().get(&id).cloned();
            if let Some(listener) = listener {
                listener();
                invoked += 1;
            }
        }

        invoked
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
