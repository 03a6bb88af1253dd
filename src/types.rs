//! Core types shared by the store, its subscriptions and middleware.

use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Whole-state listener. Invoked with no arguments after a committed change;
/// it reads whatever it needs through the store.
pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// Pure function mapping (current state, action) to the next state.
///
/// Returning a clone of the incoming `Arc` (same pointer) signals "no change"
/// and suppresses notification.
pub type Reducer<S, A> = Arc<dyn Fn(&Arc<S>, A) -> Arc<S> + Send + Sync>;

/// Boxed updater handed to [`StoreApi::update_state`](crate::StoreApi::update_state).
pub type Updater<'a, S> = Box<dyn FnOnce(&Arc<S>) -> Arc<S> + 'a>;

/// Identifier of a registered listener. Ids are handed out in increasing
/// order, so they double as the insertion order of the registry.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub u64);

impl fmt::Debug for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListenerId({})", self.0)
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle returned by every subscribe call.
///
/// Calling [`unsubscribe`](Self::unsubscribe) removes exactly the listener the
/// handle was created for; calling it again is a no-op. Dropping the handle
/// leaves the listener registered.
#[derive(Clone)]
pub struct Unsubscribe {
    remove: Arc<dyn Fn() + Send + Sync>,
}

impl Unsubscribe {
    /// Wrap a removal closure. Store replacements use this to hand out their
    /// own handles; the closure should tolerate being called more than once.
    pub fn new(remove: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            remove: Arc::new(remove),
        }
    }

    /// Remove the listener.
    pub fn unsubscribe(&self) {
        (self.remove)()
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Unsubscribe")
    }
}

/// Shallow merge of a partial record onto a state value.
///
/// `merge` produces the next state, or `None` when every field carried by the
/// partial already matches the current value. A `None` result is a no-op for
/// [`Store::set_state`](crate::Store::set_state): nothing is committed or
/// notified.
pub trait Merge: Sized {
    /// The partial record type, typically a struct of `Option` fields.
    type Partial;

    fn merge(&self, partial: Self::Partial) -> Option<Self>;
}

/// Overwrite `slot` with `value` if present and different. Returns whether the
/// slot changed.
pub fn merge_field<T: PartialEq>(slot: &mut T, value: Option<T>) -> bool {
    match value {
        Some(value) if *slot != value => {
            *slot = value;
            true
        }
        _ => false,
    }
}

/// Like [`merge_field`] but for shared nested records, compared by pointer
/// identity rather than by value.
pub fn merge_shared_field<T: ?Sized>(slot: &mut Arc<T>, value: Option<Arc<T>>) -> bool {
    match value {
        Some(value) if !Arc::ptr_eq(slot, &value) => {
            *slot = value;
            true
        }
        _ => false,
    }
}

/// JSON objects merge key by key. A non-object state is replaced by an object
/// holding the partial's fields.
impl Merge for Value {
    type Partial = Map<String, Value>;

    fn merge(&self, partial: Self::Partial) -> Option<Self> {
        let (mut next, mut changed) = match self {
            Value::Object(fields) => (fields.clone(), false),
            _ => (Map::new(), true),
        };

        for (key, value) in partial {
            if next.get(&key) != Some(&value) {
                next.insert(key, value);
                changed = true;
            }
        }

        changed.then_some(Value::Object(next))
    }
}
