//! Durable key-value storage for persisted collections.
//!
//! A backend implements [`PersistentStore`]: raw string items keyed by name,
//! the shape of a browser's local storage. Backends are allowed to fail.
//!
//! [`JsonStore`] is the typed facade the rest of the engine uses. It never
//! raises to its caller on read: a missing key, an unavailable backend and a
//! value that fails to parse all come back as the caller's default.
//!
//! # Backends
//!
//! - [`MemoryStore`] - session-only, lost when the context is dropped
//! - [`FileStore`] - one JSON file per key under a data directory
//! - [`FallbackStore`] - wraps a durable backend and degrades to memory once it
//!   reports itself unavailable

mod fallback;
mod file;
mod memory;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

pub use fallback::FallbackStore;
pub use file::FileStore;
pub use memory::MemoryStore;

/// Errors a storage backend can report.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend cannot be used at all (disabled, quota exceeded, read-only).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Reading or writing the underlying medium failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The key cannot be mapped onto the backend.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// The value could not be encoded for storage.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Raw key-value storage backend.
pub trait PersistentStore: Send + Sync + fmt::Debug {
    /// Get the stored string for `key`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove_item(&self, key: &str) -> Result<(), StoreError>;

    /// Whether values outlive the current process.
    fn is_durable(&self) -> bool {
        true
    }
}

impl<S: PersistentStore + ?Sized> PersistentStore for Arc<S> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove_item(key)
    }

    fn is_durable(&self) -> bool {
        (**self).is_durable()
    }
}

/// Typed JSON view over a [`PersistentStore`].
///
/// Cheaply cloneable; clones share the same backend.
#[derive(Debug, Clone)]
pub struct JsonStore {
    backend: Arc<dyn PersistentStore>,
}

impl JsonStore {
    /// Wrap a backend.
    #[must_use]
    pub fn new(backend: Arc<dyn PersistentStore>) -> Self {
        Self { backend }
    }

    /// Read and deserialize `key`, or return `default`.
    ///
    /// The default is returned when the key is absent, the backend fails, or
    /// the stored value does not parse as `T`. None of these reach the caller.
    pub fn read_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let raw = match self.backend.get_item(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return default,
            Err(e) => {
                warn!(key, error = %e, "Storage read failed, using default");
                return default;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Discarding malformed persisted value");
                default
            }
        }
    }

    /// Read and deserialize `key`, or return `T::default()`.
    pub fn read<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.read_or(key, T::default())
    }

    /// Serialize `value` and store it under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or the backend rejects the write.
    pub fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value)?;
        self.backend.set_item(key, &raw)?;
        debug!(key, bytes = raw.len(), "Persisted value");
        Ok(())
    }

    /// Remove `key`. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the removal.
    pub fn erase(&self, key: &str) -> Result<(), StoreError> {
        self.backend.remove_item(key)
    }

    /// Whether the underlying backend is durable.
    #[must_use]
    pub fn is_durable(&self) -> bool {
        self.backend.is_durable()
    }

    /// Access the raw backend.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn PersistentStore> {
        &self.backend
    }
}
