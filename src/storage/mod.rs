//! Key-value backends for the persistence middleware.
//!
//! - [`MemoryStorage`]: in-process map, handy for tests and ephemeral state
//! - [`FileStorage`]: one file per key under a directory
//!
//! Backends are always injected through
//! [`PersistOptions`](crate::middleware::PersistOptions); nothing is looked up
//! implicitly.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::Result;
use std::sync::Arc;

/// String key-value store holding serialized state blobs.
pub trait Storage: Send + Sync {
    /// Value under `key`, or `None` if nothing was stored.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: String) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<()>;
}

impl<T: Storage + ?Sized> Storage for Arc<T> {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: String) -> Result<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        (**self).remove_item(key)
    }
}
