//! End-to-end cart and favorites flows through a context.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use shopstate_core::Price;
use shopstate_engine::NoticeLevel;
use shopstate_integration_tests::{TestHarness, pid, product};

// =============================================================================
// Cart Scenarios
// =============================================================================

#[test]
fn test_add_merge_then_zero_quantity_empties_cart() {
    let harness = TestHarness::new();
    let ctx = harness.open_context();
    let cart = ctx.cart();

    let first = cart.add_item(&product("A", 1000), 2);
    assert!(first.is_new_insertion);
    assert_eq!(cart.lines().len(), 1);
    assert_eq!(cart.total(), Price::from_minor(2000));

    let second = cart.add_item(&product("A", 1000), 3);
    assert!(!second.is_new_insertion);
    assert_eq!(cart.line(&pid("A")).unwrap().quantity.get(), 5);
    assert_eq!(cart.total(), Price::from_minor(5000));

    cart.update_quantity(&pid("A"), 0);
    assert!(cart.lines().is_empty());
    assert_eq!(harness.read_raw("cart").as_deref(), Some("[]"));
}

#[test]
fn test_oversized_first_add_clamped() {
    let harness = TestHarness::new();
    let ctx = harness.open_context();

    ctx.cart().add_item(&product("B", 100), 150);
    assert_eq!(ctx.cart().line(&pid("B")).unwrap().quantity.get(), 99);
}

#[test]
fn test_remove_is_idempotent() {
    let harness = TestHarness::new();
    let ctx = harness.open_context();
    ctx.cart().add_item(&product("A", 100), 1);
    ctx.cart().add_item(&product("B", 100), 1);

    assert!(ctx.cart().remove_item(&pid("A")));
    let after_first = ctx.cart().lines();
    assert!(!ctx.cart().remove_item(&pid("A")));
    assert_eq!(ctx.cart().lines(), after_first);
}

// =============================================================================
// Favorites Scenarios
// =============================================================================

#[test]
fn test_toggle_twice_restores_empty_favorites() {
    let harness = TestHarness::new();
    let ctx = harness.open_context();

    assert!(ctx.favorites().toggle_favorite(&product("X", 100)));
    assert_eq!(ctx.favorites().count(), 1);
    assert!(!ctx.favorites().toggle_favorite(&product("X", 100)));
    assert!(ctx.favorites().entries().is_empty());
}

#[test]
fn test_move_favorite_to_cart_updates_both_badges() {
    let harness = TestHarness::new();
    let ctx = harness.open_context();
    ctx.favorites().toggle_favorite(&product("X", 3000));

    let mut cart_badge = ctx.cart_badge();
    let mut fav_badge = ctx.favorites_badge();
    assert_eq!(fav_badge.value(), 1);

    assert!(ctx.favorites().move_to_cart(&pid("X"), ctx.cart(), 2));
    assert!(cart_badge.sync());
    assert!(fav_badge.sync());
    assert_eq!(cart_badge.value(), 2);
    assert_eq!(fav_badge.value(), 0);
    assert_eq!(ctx.cart().total(), Price::from_minor(6000));
}

// =============================================================================
// Notice Tests
// =============================================================================

#[test]
fn test_notices_expire_with_clock() {
    let harness = TestHarness::new();
    let ctx = harness.open_context();

    ctx.notifier().success("Added to cart");
    assert_eq!(ctx.notifier().active()[0].level, NoticeLevel::Success);

    harness.clock().advance(chrono::TimeDelta::seconds(4));
    assert!(ctx.notifier().active().is_empty());
}
