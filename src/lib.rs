//! # microstore
//!
//! A small observable state container: one shared state value, controlled
//! mutation, change notification, selector-scoped subscriptions, optional
//! reducer dispatch and construction-time middleware.
//!
//! ## Core Concepts
//!
//! - **State**: held as `Arc<S>`; every committed change installs a new `Arc`
//! - **Mutation**: `set_state` (shallow merge), `update` (derive from
//!   previous), `replace`, and `dispatch` through a reducer
//! - **Notification**: immediate, or coalesced into one pass per scheduling
//!   tick (the default)
//! - **Subscriptions**: whole-state listeners and slice listeners with
//!   pluggable equality
//! - **Middleware**: logging and persistence, or your own store replacement
//!
//! ## Example
//!
//! ```ignore
//! use microstore::{create_store, merge_field, Merge, StoreOptions};
//!
//! #[derive(Clone, Debug, Default)]
//! struct AppState { count: i64, theme: String }
//!
//! #[derive(Default)]
//! struct AppPatch { count: Option<i64>, theme: Option<String> }
//!
//! impl Merge for AppState {
//!     type Partial = AppPatch;
//!     fn merge(&self, patch: AppPatch) -> Option<Self> {
//!         let mut next = self.clone();
//!         let changed = merge_field(&mut next.count, patch.count)
//!             | merge_field(&mut next.theme, patch.theme);
//!         changed.then_some(next)
//!     }
//! }
//!
//! let store = create_store(AppState::default(), StoreOptions::<_, ()>::default())?;
//! store.subscribe_to_slice(|s: &AppState| s.count, |next, prev| {
//!     println!("count {prev} -> {next}");
//! });
//!
//! store.set_state(AppPatch { count: Some(1), ..Default::default() });
//! microstore::run_pending(); // prints "count 0 -> 1"
//! ```

pub mod equality;
pub mod error;
pub mod middleware;
pub mod scheduler;
pub mod storage;
pub mod store;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use equality::{shallow_equal, strict, EqualityFn, ShallowEq, StrictEq};
pub use error::{Result, StoreError};
pub use middleware::{
    apply_middleware, from_fn, LogSink, LoggerMiddleware, Middleware, PersistMiddleware,
    PersistOptions, TracingSink,
};
pub use scheduler::{pending_tasks, run_pending, CurrentThread, Scheduler, Task, TickQueue};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::{
    create_store, create_store_shared, ActionContext, Store, StoreApi, StoreEngine, StoreOptions,
    WeakStore,
};
pub use subscriptions::{ListenerRegistry, SliceSubscription};
pub use types::{
    merge_field, merge_shared_field, Listener, ListenerId, Merge, Reducer, Unsubscribe, Updater,
};
