//! Persistence middleware: hydrate from storage once, save on every change.

use super::Middleware;
use crate::error::{Result, StoreError};
use crate::storage::Storage;
use crate::store::Store;
use crate::types::Merge;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Encodes the full state for storage.
pub type SerializeFn<S> = Arc<dyn Fn(&S) -> Result<String> + Send + Sync>;

/// Decodes a stored blob into a partial update.
pub type DeserializeFn<P> = Arc<dyn Fn(&str) -> Result<P> + Send + Sync>;

/// Persistence configuration.
pub struct PersistOptions<S: Merge> {
    /// Backend to read and write. None turns the middleware into a no-op.
    pub storage: Option<Arc<dyn Storage>>,

    /// State encoder.
    pub serialize: SerializeFn<S>,

    /// Blob decoder. Decodes into a partial so stored blobs written by older
    /// versions with fewer fields still hydrate.
    pub deserialize: DeserializeFn<S::Partial>,
}

impl<S: Merge> PersistOptions<S> {
    /// Options with a custom codec and no storage yet.
    pub fn new(
        serialize: impl Fn(&S) -> Result<String> + Send + Sync + 'static,
        deserialize: impl Fn(&str) -> Result<S::Partial> + Send + Sync + 'static,
    ) -> Self {
        Self {
            storage: None,
            serialize: Arc::new(serialize),
            deserialize: Arc::new(deserialize),
        }
    }

    /// Use `storage` as the backend.
    pub fn with_storage(mut self, storage: impl Storage + 'static) -> Self {
        self.storage = Some(Arc::new(storage));
        self
    }

    /// Use an already shared backend.
    pub fn with_shared_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }
}

impl<S> PersistOptions<S>
where
    S: Merge + Serialize,
    S::Partial: DeserializeOwned,
{
    /// JSON text codec via `serde_json`.
    pub fn json() -> Self {
        Self::new(
            |state| Ok(serde_json::to_string(state)?),
            |raw| {
                serde_json::from_str(raw).map_err(|e| StoreError::Deserialization(e.to_string()))
            },
        )
    }
}

/// Persists the state under a single storage key.
///
/// On construction the stored blob (if any) is decoded and applied with
/// [`Store::set_state`] before the store reaches the caller. After that, every
/// notification writes the full current state back. Read, decode, encode and
/// write failures are logged at WARN and otherwise ignored: the store keeps
/// working with whatever state it has.
pub struct PersistMiddleware<S: Merge> {
    key: String,
    options: PersistOptions<S>,
}

impl<S: Merge> PersistMiddleware<S> {
    pub fn new(key: impl Into<String>, options: PersistOptions<S>) -> Self {
        Self {
            key: key.into(),
            options,
        }
    }

    /// Storage key.
    pub fn key(&self) -> &str {
        &self.key
    }

    fn read_persisted(&self, storage: &dyn Storage) -> Result<Option<S::Partial>> {
        match storage.get_item(&self.key)? {
            Some(raw) => Ok(Some((self.options.deserialize)(&raw)?)),
            None => Ok(None),
        }
    }
}

impl<S, A> Middleware<S, A> for PersistMiddleware<S>
where
    S: Merge + Send + Sync + 'static,
    A: 'static,
{
    fn apply(&self, store: &Store<S, A>) -> Result<Option<Store<S, A>>> {
        let Some(storage) = self.options.storage.clone() else {
            tracing::debug!(key = %self.key, "no storage configured, persistence disabled");
            return Ok(None);
        };

        match self.read_persisted(storage.as_ref()) {
            Ok(Some(partial)) => {
                store.set_state(partial);
                tracing::debug!(key = %self.key, "hydrated state from storage");
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "discarding unreadable persisted state");
            }
        }

        let key = self.key.clone();
        let serialize = Arc::clone(&self.options.serialize);
        let weak = store.downgrade();

        store.subscribe_to_state(move || {
            let Some(store) = weak.upgrade() else {
                return;
            };
            let state = store.get_state();
            let written = serialize(&*state).and_then(|raw| storage.set_item(&key, raw));
            if let Err(e) = written {
                tracing::warn!(key = %key, error = %e, "failed to persist state");
            }
        });

        Ok(None)
    }

    fn name(&self) -> &str {
        "persist"
    }
}
