//! Cart commands.

use shopstate_core::{ProductId, ProductRef, Quantity};
use shopstate_engine::ShopContext;
use tracing::info;

use super::CliError;

/// Add `qty` of `product` to the cart.
pub fn add(ctx: &ShopContext, product: &ProductRef, qty: i64) {
    let outcome = ctx.cart().add_item(product, qty);
    let line = ctx.cart().line(&product.id);
    let quantity = line.map_or(0, |line| line.quantity.get());

    if outcome.is_new_insertion {
        ctx.notifier().success(format!("Added {} to cart", product.name));
    } else {
        ctx.notifier()
            .success(format!("Updated {} (now {quantity})", product.name));
    }
    info!(
        id = %product.id,
        quantity,
        items = ctx.cart().item_count(),
        total = %ctx.cart().total().display(ctx.cart().currency()),
        "Cart updated"
    );
}

/// Log the cart contents.
///
/// # Errors
///
/// Returns an error if JSON output was requested and cannot be rendered.
pub fn list(ctx: &ShopContext, json: bool) -> Result<(), CliError> {
    let summary = ctx.cart().summary();
    if json {
        info!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if summary.items.is_empty() {
        info!("Cart is empty");
        return Ok(());
    }
    for item in &summary.items {
        info!(
            "  {} x{}  {} ({} each)  [{}]",
            item.name, item.quantity, item.line_price, item.unit_price, item.id
        );
    }
    info!("Items: {}", summary.item_count);
    info!("Subtotal: {}", summary.subtotal);
    Ok(())
}

/// Set the quantity of a cart line.
///
/// # Errors
///
/// Returns `CliError::NotInCart` if `id` has no line.
pub fn set_quantity(ctx: &ShopContext, id: &ProductId, qty: i64) -> Result<(), CliError> {
    if ctx.cart().line(id).is_none() {
        return Err(CliError::NotInCart(id.clone()));
    }
    ctx.cart().update_quantity(id, qty);
    match Quantity::positive(qty) {
        Some(quantity) => info!(%id, %quantity, "Quantity set"),
        None => info!(%id, "Line removed"),
    }
    Ok(())
}

/// Remove a cart line.
///
/// # Errors
///
/// Returns `CliError::NotInCart` if `id` has no line.
pub fn remove(ctx: &ShopContext, id: &ProductId) -> Result<(), CliError> {
    if !ctx.cart().remove_item(id) {
        return Err(CliError::NotInCart(id.clone()));
    }
    ctx.notifier().info(format!("Removed {id} from cart"));
    Ok(())
}

/// Empty the cart.
pub fn clear(ctx: &ShopContext) {
    let lines = ctx.cart().lines().len();
    ctx.cart().clear_cart();
    info!(lines, "Cart cleared");
}
