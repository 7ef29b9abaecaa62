//! Degrade-to-memory wrapper for durable backends.

use std::io::ErrorKind;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::warn;

use super::{MemoryStore, PersistentStore, StoreError};

/// Wraps a durable backend and switches to a session-only [`MemoryStore`] the
/// first time the backend reports it is unavailable.
///
/// Once degraded the store stays degraded for the life of the value: reads and
/// writes go to memory only, and nothing written after that point survives the
/// process. Invalid keys and transient I/O failures (a missing file, an
/// interrupted call, a timeout) are reported as-is and do not trigger
/// degradation.
#[derive(Debug)]
pub struct FallbackStore<P> {
    primary: P,
    session: MemoryStore,
    degraded: AtomicBool,
}

impl<P: PersistentStore> FallbackStore<P> {
    /// Wrap `primary`.
    #[must_use]
    pub fn new(primary: P) -> Self {
        Self {
            primary,
            session: MemoryStore::new(),
            degraded: AtomicBool::new(false),
        }
    }

    /// Whether the store has fallen back to memory.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    /// The wrapped durable backend.
    #[must_use]
    pub const fn primary(&self) -> &P {
        &self.primary
    }

    fn degrade(&self, op: &str, key: &str, error: &StoreError) {
        if !self.degraded.swap(true, Ordering::AcqRel) {
            warn!(
                op,
                key,
                error = %error,
                "Durable storage unavailable, continuing with session-only storage"
            );
        }
    }
}

/// Whether `error` means the durable backend is unusable, as opposed to a
/// single operation failing. Only the former switches to memory.
fn triggers_fallback(error: &StoreError) -> bool {
    match error {
        StoreError::Unavailable(_) => true,
        StoreError::Io(e) => !matches!(
            e.kind(),
            ErrorKind::NotFound
                | ErrorKind::Interrupted
                | ErrorKind::WouldBlock
                | ErrorKind::TimedOut
        ),
        StoreError::InvalidKey(_) | StoreError::Serialize(_) => false,
    }
}

impl<P: PersistentStore> PersistentStore for FallbackStore<P> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.is_degraded() {
            return self.session.get_item(key);
        }
        match self.primary.get_item(key) {
            Err(e) if triggers_fallback(&e) => {
                self.degrade("read", key, &e);
                self.session.get_item(key)
            }
            other => other,
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.is_degraded() {
            return self.session.set_item(key, value);
        }
        match self.primary.set_item(key, value) {
            Err(e) if triggers_fallback(&e) => {
                self.degrade("write", key, &e);
                self.session.set_item(key, value)
            }
            other => other,
        }
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        if self.is_degraded() {
            return self.session.remove_item(key);
        }
        match self.primary.remove_item(key) {
            Err(e) if triggers_fallback(&e) => {
                self.degrade("erase", key, &e);
                self.session.remove_item(key)
            }
            other => other,
        }
    }

    fn is_durable(&self) -> bool {
        !self.is_degraded() && self.primary.is_durable()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    /// Backend that accepts a fixed number of writes, then reports full.
    #[derive(Debug)]
    struct QuotaStore {
        inner: MemoryStore,
        writes_left: AtomicUsize,
    }

    impl QuotaStore {
        fn new(writes: usize) -> Self {
            Self {
                inner: MemoryStore::new(),
                writes_left: AtomicUsize::new(writes),
            }
        }
    }

    impl PersistentStore for QuotaStore {
        fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get_item(key)
        }

        fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
            let left = self.writes_left.load(Ordering::SeqCst);
            if left == 0 {
                return Err(StoreError::Unavailable("quota exceeded".to_string()));
            }
            self.writes_left.store(left - 1, Ordering::SeqCst);
            self.inner.set_item(key, value)
        }

        fn remove_item(&self, key: &str) -> Result<(), StoreError> {
            self.inner.remove_item(key)
        }
    }

    #[test]
    fn test_passes_through_while_healthy() {
        let store = FallbackStore::new(QuotaStore::new(5));
        store.set_item("cart", "[1]").unwrap();
        assert_eq!(store.primary().inner.get_item("cart").unwrap().as_deref(), Some("[1]"));
        assert!(!store.is_degraded());
        assert!(store.is_durable());
    }

    #[test]
    fn test_degrades_on_quota_and_keeps_write() {
        let store = FallbackStore::new(QuotaStore::new(0));
        store.set_item("cart", "[2]").unwrap();

        assert!(store.is_degraded());
        assert!(!store.is_durable());
        assert_eq!(store.get_item("cart").unwrap().as_deref(), Some("[2]"));
        // The durable backend never saw the write.
        assert_eq!(store.primary().inner.get_item("cart").unwrap(), None);
    }

    /// Backend whose writes fail once with `kind`, then succeed.
    #[derive(Debug)]
    struct FlakyStore {
        inner: MemoryStore,
        kind: std::io::ErrorKind,
        failed: AtomicBool,
    }

    impl PersistentStore for FlakyStore {
        fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get_item(key)
        }

        fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
            if !self.failed.swap(true, Ordering::SeqCst) {
                return Err(std::io::Error::from(self.kind).into());
            }
            self.inner.set_item(key, value)
        }

        fn remove_item(&self, key: &str) -> Result<(), StoreError> {
            self.inner.remove_item(key)
        }
    }

    fn flaky(kind: std::io::ErrorKind) -> FallbackStore<FlakyStore> {
        FallbackStore::new(FlakyStore {
            inner: MemoryStore::new(),
            kind,
            failed: AtomicBool::new(false),
        })
    }

    #[test]
    fn test_transient_io_error_does_not_degrade() {
        let store = flaky(std::io::ErrorKind::NotFound);
        assert!(matches!(store.set_item("cart", "[1]"), Err(StoreError::Io(_))));
        assert!(!store.is_degraded());

        store.set_item("cart", "[2]").unwrap();
        assert_eq!(store.primary().inner.get_item("cart").unwrap().as_deref(), Some("[2]"));
    }

    #[test]
    fn test_permission_denied_degrades() {
        let store = flaky(std::io::ErrorKind::PermissionDenied);
        store.set_item("cart", "[1]").unwrap();
        assert!(store.is_degraded());
    }

    #[test]
    fn test_two_contexts_writing_concurrently_stay_durable() {
        let dir = tempfile::tempdir().unwrap();
        let stores: Vec<_> = (0..2)
            .map(|_| {
                std::sync::Arc::new(FallbackStore::new(
                    super::super::FileStore::open(dir.path()).unwrap(),
                ))
            })
            .collect();

        let handles: Vec<_> = stores
            .iter()
            .enumerate()
            .map(|(tab, store)| {
                let store = std::sync::Arc::clone(store);
                std::thread::spawn(move || {
                    for i in 0..1000 {
                        store.set_item("cart", &format!("[{tab},{i}]")).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        for store in &stores {
            assert!(!store.is_degraded());
            assert!(store.is_durable());
        }
    }

    #[test]
    fn test_invalid_key_does_not_degrade() {
        let dir = tempfile::tempdir().unwrap();
        let store = FallbackStore::new(super::super::FileStore::open(dir.path()).unwrap());
        assert!(matches!(
            store.set_item("a/b", "x"),
            Err(StoreError::InvalidKey(_))
        ));
        assert!(!store.is_degraded());
    }
}
