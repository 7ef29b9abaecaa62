//! Shopping cart.
//!
//! Cart lines copy the product's price when first added and never look it up
//! again, so an in-cart price does not move when the catalog changes. Merging
//! into an existing line only changes its quantity.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shopstate_core::{CurrencyCode, Price, ProductId, ProductRef, Quantity};
use tracing::instrument;

use crate::collection::{AddOutcome, Aggregate, CollectionEntry, CollectionKind, CollectionManager};
use crate::indicator::AggregateSource;

/// One product in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: ProductId,
    pub name: String,
    /// Unit price captured when the line was created.
    pub price: Price,
    pub quantity: Quantity,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub category: String,
    /// Fields written by other producers, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CartLine {
    /// Snapshot `product` into a new line.
    #[must_use]
    pub fn from_product(product: &ProductRef, quantity: Quantity) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            quantity,
            image: product.image.clone(),
            brand: product.brand.clone(),
            category: product.category.clone(),
            extra: Map::new(),
        }
    }

    /// Unit price times quantity.
    #[must_use]
    pub const fn line_price(&self) -> Price {
        self.price.times(self.quantity.get())
    }
}

impl CollectionEntry for CartLine {
    const PRICED: bool = true;

    fn id(&self) -> &ProductId {
        &self.id
    }

    fn weight(&self) -> u32 {
        self.quantity.get()
    }

    fn line_total(&self) -> Price {
        self.line_price()
    }

    /// A stored line with a quantity of zero or less is a removed line, not a
    /// line of one.
    fn retain_stored(raw: &Value) -> bool {
        raw.get("quantity")
            .and_then(Value::as_f64)
            .is_none_or(|quantity| quantity > 0.0)
    }
}

/// Display data for one cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartItemSummary {
    pub id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_price: String,
    pub image: Option<String>,
}

/// Display data for the whole cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartSummary {
    pub items: Vec<CartItemSummary>,
    pub subtotal: String,
    pub item_count: u32,
}

/// Cart operations over the persisted `cart` collection.
#[derive(Debug, Clone)]
pub struct CartManager {
    lines: CollectionManager<CartLine>,
    currency: CurrencyCode,
}

impl CartManager {
    /// Wrap a collection manager.
    #[must_use]
    pub const fn new(lines: CollectionManager<CartLine>, currency: CurrencyCode) -> Self {
        Self { lines, currency }
    }

    /// Add `quantity` of `product`.
    ///
    /// A new line gets `clamp(quantity, 1, 99)` and the product's current
    /// price. An existing line gets `clamp(existing + quantity, 1, 99)` and
    /// keeps its original price.
    #[instrument(skip(self, product), fields(id = %product.id))]
    pub fn add_item(&self, product: &ProductRef, quantity: i64) -> AddOutcome {
        let line = CartLine::from_product(product, Quantity::clamped(quantity));
        self.lines.add(line, |existing, _incoming| {
            existing.quantity = existing.quantity.saturating_add(quantity);
        })
    }

    /// Add a single unit of `product`.
    pub fn add_one(&self, product: &ProductRef) -> AddOutcome {
        self.add_item(product, 1)
    }

    /// Set the quantity of a line.
    ///
    /// Zero or less removes the line. Larger values are clamped to 99. Unknown
    /// IDs are ignored.
    #[instrument(skip(self))]
    pub fn update_quantity(&self, id: &ProductId, quantity: i64) {
        match Quantity::positive(quantity) {
            Some(quantity) => {
                self.lines.update_entry(id, |line| line.quantity = quantity);
            }
            None => {
                self.lines.remove(id);
            }
        }
    }

    /// Remove a line. Idempotent.
    pub fn remove_item(&self, id: &ProductId) -> bool {
        self.lines.remove(id)
    }

    /// Remove every line.
    pub fn clear_cart(&self) {
        self.lines.clear();
    }

    /// Current lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.lines.load()
    }

    /// The line for `id`, if present.
    #[must_use]
    pub fn line(&self, id: &ProductId) -> Option<CartLine> {
        self.lines.get(id)
    }

    /// Sum of line quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.aggregate().count
    }

    /// Sum of snapshot price times quantity.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.aggregate().total.unwrap_or(Price::ZERO)
    }

    /// Currency used for display.
    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    /// Formatted cart contents for display.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        let lines = self.lines.load();
        let aggregate = Aggregate::of(&lines);
        CartSummary {
            items: lines
                .iter()
                .map(|line| CartItemSummary {
                    id: line.id.clone(),
                    name: line.name.clone(),
                    quantity: line.quantity.get(),
                    unit_price: line.price.display(self.currency),
                    line_price: line.line_price().display(self.currency),
                    image: (!line.image.is_empty()).then(|| line.image.clone()),
                })
                .collect(),
            subtotal: aggregate
                .total
                .unwrap_or(Price::ZERO)
                .display(self.currency),
            item_count: aggregate.count,
        }
    }

    /// The underlying collection.
    #[must_use]
    pub const fn collection(&self) -> &CollectionManager<CartLine> {
        &self.lines
    }
}

impl AggregateSource for CartManager {
    fn kind(&self) -> CollectionKind {
        self.lines.kind()
    }

    fn aggregate(&self) -> Aggregate {
        self.lines.aggregate()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;

    use super::*;
    use crate::feed::ChangeFeed;
    use crate::store::{JsonStore, MemoryStore};

    fn cart_on(store: &JsonStore) -> CartManager {
        CartManager::new(
            CollectionManager::new(
                store.clone(),
                "cart",
                CollectionKind::Cart,
                ChangeFeed::default(),
            ),
            CurrencyCode::USD,
        )
    }

    fn cart() -> CartManager {
        cart_on(&JsonStore::new(Arc::new(MemoryStore::new())))
    }

    fn product(id: &str, price: i64) -> ProductRef {
        ProductRef::new(ProductId::parse(id).unwrap(), format!("Product {id}"), Price::from_minor(price))
    }

    fn pid(id: &str) -> ProductId {
        ProductId::parse(id).unwrap()
    }

    #[test]
    fn test_add_merge_and_zero_removes() {
        let cart = cart();

        cart.add_item(&product("A", 1000), 2);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.line(&pid("A")).unwrap().quantity.get(), 2);
        assert_eq!(cart.total(), Price::from_minor(2000));

        cart.add_item(&product("A", 1000), 3);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.line(&pid("A")).unwrap().quantity.get(), 5);
        assert_eq!(cart.total(), Price::from_minor(5000));

        cart.update_quantity(&pid("A"), 0);
        assert!(cart.lines().is_empty());
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn test_new_line_quantity_clamped() {
        let cart = cart();
        cart.add_item(&product("B", 100), 150);
        assert_eq!(cart.line(&pid("B")).unwrap().quantity.get(), 99);

        cart.add_item(&product("C", 100), -3);
        assert_eq!(cart.line(&pid("C")).unwrap().quantity.get(), 1);
    }

    #[test]
    fn test_merge_clamps_at_max() {
        let cart = cart();
        cart.add_item(&product("A", 100), 60);
        cart.add_item(&product("A", 100), 60);
        assert_eq!(cart.item_count(), 99);
    }

    #[test]
    fn test_price_snapshot_survives_catalog_change() {
        let cart = cart();
        cart.add_item(&product("A", 1000), 1);
        cart.add_item(&product("A", 1500), 1);

        let line = cart.line(&pid("A")).unwrap();
        assert_eq!(line.price, Price::from_minor(1000));
        assert_eq!(cart.total(), Price::from_minor(2000));
    }

    #[test]
    fn test_update_quantity_clamps_and_ignores_unknown() {
        let cart = cart();
        cart.add_item(&product("A", 100), 1);

        cart.update_quantity(&pid("A"), 1000);
        assert_eq!(cart.item_count(), 99);

        cart.update_quantity(&pid("nope"), 4);
        assert_eq!(cart.lines().len(), 1);
    }

    #[test]
    fn test_zero_quantity_matches_remove() {
        let via_update = cart();
        let via_remove = cart();
        for c in [&via_update, &via_remove] {
            c.add_item(&product("A", 100), 2);
            c.add_item(&product("B", 300), 1);
        }

        via_update.update_quantity(&pid("A"), 0);
        via_remove.remove_item(&pid("A"));
        assert_eq!(via_update.lines(), via_remove.lines());
    }

    #[test]
    fn test_item_count_is_quantity_sum_not_lines() {
        let cart = cart();
        cart.add_item(&product("A", 100), 2);
        cart.add_item(&product("B", 100), 3);
        assert_eq!(cart.item_count(), 5);
        assert_eq!(cart.lines().len(), 2);
    }

    #[test]
    fn test_summary_formats_prices() {
        let cart = cart();
        cart.add_item(&product("A", 1999).with_image("/img/a.png"), 2);
        cart.add_item(&product("B", 250), 1);

        let summary = cart.summary();
        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.subtotal, "$42.48");
        assert_eq!(summary.items[0].unit_price, "$19.99");
        assert_eq!(summary.items[0].line_price, "$39.98");
        assert_eq!(summary.items[0].image.as_deref(), Some("/img/a.png"));
        assert_eq!(summary.items[1].image, None);
    }

    #[test]
    fn test_persisted_layout() {
        let store = JsonStore::new(Arc::new(MemoryStore::new()));
        let cart = cart_on(&store);
        cart.add_item(&product("A", 1000).with_brand("Acme").with_category("mugs"), 2);

        let raw = store.backend().get_item("cart").unwrap().unwrap();
        let json: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json[0]["id"], "A");
        assert_eq!(json[0]["price"], 1000);
        assert_eq!(json[0]["quantity"], 2);
        assert_eq!(json[0]["brand"], "Acme");
        assert_eq!(json[0]["category"], "mugs");
    }

    #[test]
    fn test_unknown_fields_survive_rewrite() {
        let store = JsonStore::new(Arc::new(MemoryStore::new()));
        store
            .backend()
            .set_item(
                "cart",
                r#"[{"id":"A","name":"Mug","price":500,"quantity":1,"color":"red"}]"#,
            )
            .unwrap();

        let cart = cart_on(&store);
        cart.add_item(&product("A", 500), 1);

        let line = cart.line(&pid("A")).unwrap();
        assert_eq!(line.quantity.get(), 2);
        assert_eq!(line.extra.get("color"), Some(&Value::from("red")));
    }

    #[test]
    fn test_non_positive_stored_quantity_drops_line() {
        let store = JsonStore::new(Arc::new(MemoryStore::new()));
        store
            .backend()
            .set_item(
                "cart",
                r#"[{"id":"A","name":"Mug","price":500,"quantity":0},
                    {"id":"B","name":"Tee","price":900,"quantity":2},
                    {"id":"C","name":"Cap","price":700,"quantity":-2}]"#,
            )
            .unwrap();

        let cart = cart_on(&store);
        let ids: Vec<_> = cart.lines().into_iter().map(|line| line.id).collect();
        assert_eq!(ids, vec![pid("B")]);
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.total(), Price::from_minor(1800));

        // The next write persists the cleaned collection.
        cart.add_one(&product("D", 100));
        let raw: Vec<Value> =
            serde_json::from_str(&store.backend().get_item("cart").unwrap().unwrap()).unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0]["id"], "B");
    }

    #[test]
    fn test_corrupt_cart_loads_empty() {
        let store = JsonStore::new(Arc::new(MemoryStore::new()));
        store.backend().set_item("cart", "[{broken").unwrap();
        let cart = cart_on(&store);
        assert!(cart.lines().is_empty());
        assert_eq!(cart.total(), Price::ZERO);
    }

    proptest! {
        #[test]
        fn prop_two_adds_make_one_clamped_line(q1 in 1i64..=99, q2 in -200i64..200) {
            let cart = cart();
            cart.add_item(&product("P", 100), q1);
            cart.add_item(&product("P", 100), q2);

            let lines = cart.lines();
            prop_assert_eq!(lines.len(), 1);
            let expected = (q1 + q2).clamp(1, 99);
            prop_assert_eq!(i64::from(lines[0].quantity), expected);
        }

        #[test]
        fn prop_item_count_matches_sum(adds in proptest::collection::vec((0u8..5, 1i64..40), 0..12)) {
            let cart = cart();
            for (slot, qty) in &adds {
                cart.add_item(&product(&format!("P{slot}"), 100), *qty);
            }

            let lines = cart.lines();
            let sum: u32 = lines.iter().map(|l| l.quantity.get()).sum();
            prop_assert_eq!(cart.item_count(), sum);
            prop_assert_eq!(cart.item_count() == 0, lines.is_empty());
        }
    }
}
