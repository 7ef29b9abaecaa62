//! Generic id-unique ordered collections over a [`JsonStore`].
//!
//! [`CollectionManager`] is the single implementation behind both the cart
//! and the favorites list. It holds no entries in memory: every operation
//! reloads the whole collection from storage, applies its change, and writes
//! the whole collection back before returning. Callers always observe the
//! latest persisted state, including writes made by other contexts sharing
//! the same store.
//!
//! Failures never reach the caller. Malformed or missing data loads as an
//! empty collection, and a failed write is logged.

use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shopstate_core::{Price, ProductId};
use tracing::{error, instrument, warn};

use crate::feed::{ChangeEvent, ChangeFeed, ChangeOp};
use crate::store::JsonStore;

/// Which persisted collection an event or indicator refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Cart,
    Favorites,
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cart => write!(f, "cart"),
            Self::Favorites => write!(f, "favorites"),
        }
    }
}

/// An entry that can live in a [`CollectionManager`].
pub trait CollectionEntry: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Whether aggregates over this entry type carry a money total.
    const PRICED: bool = false;

    /// Uniqueness key within the collection.
    fn id(&self) -> &ProductId;

    /// Contribution of this entry to [`Aggregate::count`].
    fn weight(&self) -> u32 {
        1
    }

    /// Contribution of this entry to [`Aggregate::total`].
    fn line_total(&self) -> Price {
        Price::ZERO
    }

    /// Whether a persisted entry should be kept when the collection is loaded.
    ///
    /// Runs on the raw JSON before it is decoded, so entries can be dropped on
    /// values their typed form would normalize away.
    fn retain_stored(_raw: &Value) -> bool {
        true
    }
}

/// Derived values over a whole collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Aggregate {
    /// Sum of entry weights (item count for the cart, entries for favorites).
    pub count: u32,
    /// Number of distinct entries.
    pub lines: usize,
    /// Sum of line totals, for priced collections only.
    pub total: Option<Price>,
}

impl Aggregate {
    /// Compute the aggregate of `entries`.
    #[must_use]
    pub fn of<T: CollectionEntry>(entries: &[T]) -> Self {
        let count = entries
            .iter()
            .fold(0_u32, |acc, entry| acc.saturating_add(entry.weight()));
        let total = T::PRICED.then(|| entries.iter().map(T::line_total).sum::<Price>());
        Self {
            count,
            lines: entries.len(),
            total,
        }
    }

    /// Whether the collection is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lines == 0
    }
}

/// Result of [`CollectionManager::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOutcome {
    /// `true` if the entry was appended, `false` if it was merged.
    pub is_new_insertion: bool,
}

/// CRUD and merge operations over one persisted collection.
///
/// Clones share the store, the change feed and the write lock.
pub struct CollectionManager<T> {
    store: JsonStore,
    key: Arc<str>,
    kind: CollectionKind,
    feed: ChangeFeed,
    write_lock: Arc<Mutex<()>>,
    _entry: PhantomData<fn() -> T>,
}

impl<T> Clone for CollectionManager<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            key: Arc::clone(&self.key),
            kind: self.kind,
            feed: self.feed.clone(),
            write_lock: Arc::clone(&self.write_lock),
            _entry: PhantomData,
        }
    }
}

impl<T> fmt::Debug for CollectionManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionManager")
            .field("key", &self.key)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl<T: CollectionEntry> CollectionManager<T> {
    /// Create a manager for the collection stored under `key`.
    ///
    /// Nothing is read until the first operation.
    #[must_use]
    pub fn new(
        store: JsonStore,
        key: impl Into<Arc<str>>,
        kind: CollectionKind,
        feed: ChangeFeed,
    ) -> Self {
        Self {
            store,
            key: key.into(),
            kind,
            feed,
            write_lock: Arc::new(Mutex::new(())),
            _entry: PhantomData,
        }
    }

    /// Storage key of this collection.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Which collection this manages.
    #[must_use]
    pub const fn kind(&self) -> CollectionKind {
        self.kind
    }

    /// Load the current entries in insertion order.
    ///
    /// Always re-reads storage. Entries rejected by
    /// [`CollectionEntry::retain_stored`] are skipped.
    #[must_use]
    pub fn load(&self) -> Vec<T> {
        let raw: Vec<Value> = self.store.read(&self.key);
        let kept = raw.into_iter().filter(T::retain_stored).collect();
        serde_json::from_value(Value::Array(kept)).unwrap_or_else(|e| {
            warn!(collection = %self.key, error = %e, "Discarding malformed persisted collection");
            Vec::new()
        })
    }

    /// Get the entry with `id`, if present.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<T> {
        self.load().into_iter().find(|entry| entry.id() == id)
    }

    /// Whether an entry with `id` is present.
    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.load().iter().any(|entry| entry.id() == id)
    }

    /// Insert `entry`, or merge it into the existing entry with the same ID.
    ///
    /// `merge` receives the stored entry and the incoming one. New entries are
    /// appended at the end.
    #[instrument(skip_all, fields(collection = %self.key, id = %entry.id()))]
    pub fn add<F>(&self, entry: T, merge: F) -> AddOutcome
    where
        F: FnOnce(&mut T, T),
    {
        let _guard = self.lock();
        let mut entries = self.load();
        let id = entry.id().clone();

        let is_new_insertion = match entries.iter_mut().find(|existing| existing.id() == &id) {
            Some(existing) => {
                merge(existing, entry);
                false
            }
            None => {
                entries.push(entry);
                true
            }
        };

        self.persist(&entries);
        self.publish(ChangeOp::Added {
            id,
            new_insertion: is_new_insertion,
        });
        AddOutcome { is_new_insertion }
    }

    /// Remove the entry with `id`.
    ///
    /// Removing an absent ID leaves storage untouched. Returns whether an
    /// entry was removed.
    #[instrument(skip(self), fields(collection = %self.key))]
    pub fn remove(&self, id: &ProductId) -> bool {
        let _guard = self.lock();
        let mut entries = self.load();
        let before = entries.len();
        entries.retain(|entry| entry.id() != id);
        if entries.len() == before {
            return false;
        }

        self.persist(&entries);
        self.publish(ChangeOp::Removed { id: id.clone() });
        true
    }

    /// Mutate the entry with `id` in place.
    ///
    /// No-op if `id` is absent. A mutator that changes the entry's ID is
    /// rejected and the entry is left as it was. Returns whether the entry was
    /// updated.
    #[instrument(skip(self, mutator), fields(collection = %self.key))]
    pub fn update_entry<F>(&self, id: &ProductId, mutator: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        let _guard = self.lock();
        let mut entries = self.load();
        let Some(entry) = entries.iter_mut().find(|entry| entry.id() == id) else {
            return false;
        };

        let original = entry.clone();
        mutator(entry);
        if entry.id() != id {
            warn!(new_id = %entry.id(), "Mutator changed entry id, discarding update");
            *entry = original;
            return false;
        }

        self.persist(&entries);
        self.publish(ChangeOp::Updated { id: id.clone() });
        true
    }

    /// Flip membership of `entry`.
    ///
    /// Removes the stored entry with the same ID and returns `false`, or
    /// appends `entry` and returns `true`.
    #[instrument(skip_all, fields(collection = %self.key, id = %entry.id()))]
    pub fn toggle(&self, entry: T) -> bool {
        let _guard = self.lock();
        let mut entries = self.load();
        let id = entry.id().clone();

        let member = match entries.iter().position(|existing| existing.id() == &id) {
            Some(index) => {
                entries.remove(index);
                false
            }
            None => {
                entries.push(entry);
                true
            }
        };

        self.persist(&entries);
        self.publish(ChangeOp::Toggled { id, member });
        member
    }

    /// Remove every entry.
    #[instrument(skip(self), fields(collection = %self.key))]
    pub fn clear(&self) {
        let _guard = self.lock();
        self.persist(&[]);
        self.publish(ChangeOp::Cleared);
    }

    /// Compute the aggregate over the current entries.
    ///
    /// Always re-reads storage.
    #[must_use]
    pub fn aggregate(&self) -> Aggregate {
        Aggregate::of(&self.load())
    }

    fn persist(&self, entries: &[T]) {
        if let Err(e) = self.store.write(&self.key, entries) {
            error!(collection = %self.key, error = %e, "Failed to persist collection");
        }
    }

    fn publish(&self, op: ChangeOp) {
        self.feed.publish(ChangeEvent::new(self.kind, op));
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::store::MemoryStore;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct Tally {
        id: ProductId,
        n: u32,
    }

    impl CollectionEntry for Tally {
        fn id(&self) -> &ProductId {
            &self.id
        }

        fn weight(&self) -> u32 {
            self.n
        }
    }

    fn tally(id: &str, n: u32) -> Tally {
        Tally {
            id: ProductId::parse(id).unwrap(),
            n,
        }
    }

    fn manager() -> CollectionManager<Tally> {
        let store = JsonStore::new(Arc::new(MemoryStore::new()));
        CollectionManager::new(store, "tallies", CollectionKind::Cart, ChangeFeed::default())
    }

    fn sum(existing: &mut Tally, incoming: Tally) {
        existing.n += incoming.n;
    }

    #[test]
    fn test_add_appends_then_merges() {
        let m = manager();
        assert!(m.add(tally("a", 1), sum).is_new_insertion);
        assert!(m.add(tally("b", 2), sum).is_new_insertion);
        assert!(!m.add(tally("a", 4), sum).is_new_insertion);

        assert_eq!(m.load(), vec![tally("a", 5), tally("b", 2)]);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let m = manager();
        m.add(tally("a", 1), sum);
        assert!(m.remove(&ProductId::parse("a").unwrap()));
        let after_first = m.load();
        assert!(!m.remove(&ProductId::parse("a").unwrap()));
        assert_eq!(m.load(), after_first);
    }

    #[test]
    fn test_update_entry() {
        let m = manager();
        m.add(tally("a", 1), sum);
        let id = ProductId::parse("a").unwrap();

        assert!(m.update_entry(&id, |t| t.n = 9));
        assert_eq!(m.get(&id).unwrap().n, 9);

        let missing = ProductId::parse("zzz").unwrap();
        assert!(!m.update_entry(&missing, |t| t.n = 1));
        assert_eq!(m.load().len(), 1);
    }

    #[test]
    fn test_update_entry_cannot_change_id() {
        let m = manager();
        m.add(tally("a", 1), sum);
        let id = ProductId::parse("a").unwrap();

        assert!(!m.update_entry(&id, |t| t.id = ProductId::parse("b").unwrap()));
        assert_eq!(m.load(), vec![tally("a", 1)]);
    }

    #[test]
    fn test_toggle_round_trip() {
        let m = manager();
        m.add(tally("keep", 1), sum);

        assert!(m.toggle(tally("x", 1)));
        assert!(m.contains(&ProductId::parse("x").unwrap()));
        assert!(!m.toggle(tally("x", 1)));
        assert_eq!(m.load(), vec![tally("keep", 1)]);
    }

    #[test]
    fn test_clear_and_aggregate() {
        let m = manager();
        m.add(tally("a", 2), sum);
        m.add(tally("b", 3), sum);

        let agg = m.aggregate();
        assert_eq!(agg.count, 5);
        assert_eq!(agg.lines, 2);
        assert_eq!(agg.total, None);

        m.clear();
        assert!(m.aggregate().is_empty());
        assert_eq!(m.aggregate().count, 0);
    }

    #[test]
    fn test_mutations_publish_events() {
        let feed = ChangeFeed::default();
        let store = JsonStore::new(Arc::new(MemoryStore::new()));
        let m: CollectionManager<Tally> =
            CollectionManager::new(store, "tallies", CollectionKind::Favorites, feed.clone());
        let mut rx = feed.subscribe();

        m.add(tally("a", 1), sum);
        m.remove(&ProductId::parse("missing").unwrap());
        m.clear();

        let first = rx.try_recv().unwrap();
        assert_eq!(first.kind, CollectionKind::Favorites);
        assert!(matches!(first.op, ChangeOp::Added { new_insertion: true, .. }));
        assert_eq!(rx.try_recv().unwrap().op, ChangeOp::Cleared);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_corrupt_storage_loads_empty() {
        let store = JsonStore::new(Arc::new(MemoryStore::new()));
        store.backend().set_item("tallies", "not json at all").unwrap();
        let m: CollectionManager<Tally> =
            CollectionManager::new(store, "tallies", CollectionKind::Cart, ChangeFeed::default());

        assert!(m.load().is_empty());
        m.add(tally("a", 1), sum);
        assert_eq!(m.load(), vec![tally("a", 1)]);
    }
}
