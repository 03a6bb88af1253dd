//! Listener registry and slice subscriptions.
//!
//! Two kinds of subscriber share one registry:
//! - Whole-state listeners, invoked after every committed change
//! - Slice subscriptions, which re-run a selector on every change and only
//!   call through when the selected slice differs under their equality
//!
//! A slice subscription is registered as an ordinary whole-state listener
//! wrapping a [`SliceSubscription`], so both kinds share insertion order and
//! removal semantics.
//!
//! # Example
//!
//! ```ignore
//! let registry = ListenerRegistry::new();
//! let id = registry.subscribe(Arc::new(|| println!("changed")));
//!
//! registry.notify_all(); // prints "changed"
//! registry.unsubscribe(id);
//! registry.notify_all(); // prints nothing
//! ```

mod manager;
mod slice;

pub use manager::ListenerRegistry;
pub use slice::SliceSubscription;
