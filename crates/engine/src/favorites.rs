//! Favorites list.
//!
//! Membership is boolean: a product is either present or not, with no
//! quantity and no cap on the number of entries.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shopstate_core::{Price, ProductId, ProductRef};
use tracing::{debug, instrument};

use crate::cart::CartManager;
use crate::clock::Clock;
use crate::collection::{Aggregate, CollectionEntry, CollectionKind, CollectionManager};
use crate::indicator::AggregateSource;

/// One favorited product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteEntry {
    pub id: ProductId,
    pub name: String,
    /// Price at the time the product was favorited.
    #[serde(default)]
    pub price: Price,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub category: String,
    /// Date the entry was created. Never changes afterwards.
    pub added_date: NaiveDate,
    /// Fields written by other producers, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FavoriteEntry {
    /// Copy `product` into a new entry dated `added_date`.
    #[must_use]
    pub fn from_product(product: &ProductRef, added_date: NaiveDate) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            image: product.image.clone(),
            brand: product.brand.clone(),
            category: product.category.clone(),
            added_date,
            extra: Map::new(),
        }
    }

    /// Rebuild a catalog reference from the copied display fields.
    #[must_use]
    pub fn to_product_ref(&self) -> ProductRef {
        ProductRef::new(self.id.clone(), self.name.clone(), self.price)
            .with_image(self.image.clone())
            .with_brand(self.brand.clone())
            .with_category(self.category.clone())
    }
}

impl CollectionEntry for FavoriteEntry {
    fn id(&self) -> &ProductId {
        &self.id
    }
}

/// Favorites operations over the persisted `favorites` collection.
#[derive(Debug, Clone)]
pub struct FavoritesManager {
    entries: CollectionManager<FavoriteEntry>,
    clock: Arc<dyn Clock>,
}

impl FavoritesManager {
    /// Wrap a collection manager. `clock` supplies the date stamped on new entries.
    #[must_use]
    pub fn new(entries: CollectionManager<FavoriteEntry>, clock: Arc<dyn Clock>) -> Self {
        Self { entries, clock }
    }

    /// Add `product` if absent, remove it if present.
    ///
    /// Returns the resulting membership.
    #[instrument(skip(self, product), fields(id = %product.id))]
    pub fn toggle_favorite(&self, product: &ProductRef) -> bool {
        let entry = FavoriteEntry::from_product(product, self.clock.today());
        self.entries.toggle(entry)
    }

    /// Whether `id` is a favorite, checked against freshly loaded storage.
    #[must_use]
    pub fn is_favorite(&self, id: &ProductId) -> bool {
        self.entries.contains(id)
    }

    /// Remove `id` from favorites. Idempotent.
    pub fn remove_favorite(&self, id: &ProductId) -> bool {
        self.entries.remove(id)
    }

    /// Current entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> Vec<FavoriteEntry> {
        self.entries.load()
    }

    /// Number of favorites.
    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.aggregate().lines
    }

    /// Move a favorite into the cart.
    ///
    /// The cart line is priced from the favorite's copied price. Returns
    /// `false` and leaves both collections untouched if `id` is not a favorite.
    #[instrument(skip(self, cart))]
    pub fn move_to_cart(&self, id: &ProductId, cart: &CartManager, quantity: i64) -> bool {
        let Some(entry) = self.entries.get(id) else {
            debug!("Not a favorite, nothing to move");
            return false;
        };
        cart.add_item(&entry.to_product_ref(), quantity);
        self.entries.remove(id);
        true
    }

    /// The underlying collection.
    #[must_use]
    pub const fn collection(&self) -> &CollectionManager<FavoriteEntry> {
        &self.entries
    }
}

impl AggregateSource for FavoritesManager {
    fn kind(&self) -> CollectionKind {
        self.entries.kind()
    }

    fn aggregate(&self) -> Aggregate {
        self.entries.aggregate()
    }
}
