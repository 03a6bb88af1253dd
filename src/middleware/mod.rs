//! Construction-time middleware.
//!
//! A middleware runs once, right after the base store is built. It gets the
//! store assembled so far and either:
//! - returns `Ok(None)`, leaving the store as is (it may have subscribed to
//!   it as a side effect), or
//! - returns `Ok(Some(store))`, replacing the store for every later
//!   middleware and for the caller of [`create_store`](crate::create_store).
//!
//! Errors abort construction and propagate out of `create_store` untouched.
//!
//! # Example
//!
//! ```ignore
//! let store = create_store(
//!     AppState::default(),
//!     StoreOptions::default()
//!         .with_middleware(LoggerMiddleware::new("app"))
//!         .with_middleware(PersistMiddleware::new(
//!             "app-state",
//!             PersistOptions::json().with_storage(MemoryStorage::new()),
//!         )),
//! )?;
//! ```

mod logger;
mod persist;

pub use logger::{LogSink, LoggerMiddleware, TracingSink};
pub use persist::{DeserializeFn, PersistMiddleware, PersistOptions, SerializeFn};

use crate::error::Result;
use crate::store::Store;

/// A construction-time transform over a store.
pub trait Middleware<S, A> {
    fn apply(&self, store: &Store<S, A>) -> Result<Option<Store<S, A>>>;

    /// Name used in diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Middleware built from a closure. See [`from_fn`].
pub struct FnMiddleware<F> {
    f: F,
}

/// Turn a closure into a [`Middleware`].
pub fn from_fn<S, A, F>(f: F) -> FnMiddleware<F>
where
    F: Fn(&Store<S, A>) -> Result<Option<Store<S, A>>>,
{
    FnMiddleware { f }
}

impl<S, A, F> Middleware<S, A> for FnMiddleware<F>
where
    F: Fn(&Store<S, A>) -> Result<Option<Store<S, A>>>,
{
    fn apply(&self, store: &Store<S, A>) -> Result<Option<Store<S, A>>> {
        (self.f)(store)
    }
}

/// Apply `middleware` in order, threading replacements through.
pub fn apply_middleware<S, A>(
    mut store: Store<S, A>,
    middleware: impl IntoIterator<Item = Box<dyn Middleware<S, A>>>,
) -> Result<Store<S, A>>
where
    S: Send + Sync + 'static,
    A: 'static,
{
    for mw in middleware {
        match mw.apply(&store) {
            Ok(Some(replacement)) => {
                tracing::debug!(middleware = mw.name(), "middleware replaced store");
                store = replacement;
            }
            Ok(None) => {
                tracing::debug!(middleware = mw.name(), "middleware applied");
            }
            Err(e) => {
                tracing::debug!(middleware = mw.name(), error = %e, "middleware failed");
                return Err(e);
            }
        }
    }
    Ok(store)
}
