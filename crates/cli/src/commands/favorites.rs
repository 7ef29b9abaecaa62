//! Favorites commands.

use shopstate_core::{ProductId, ProductRef};
use shopstate_engine::ShopContext;
use tracing::info;

use super::CliError;

/// Toggle `product` in favorites.
pub fn toggle(ctx: &ShopContext, product: &ProductRef) {
    if ctx.favorites().toggle_favorite(product) {
        ctx.notifier()
            .success(format!("Added {} to favorites", product.name));
    } else {
        ctx.notifier()
            .info(format!("Removed {} from favorites", product.name));
    }
    info!(count = ctx.favorites().count(), "Favorites updated");
}

/// Log the favorites.
///
/// # Errors
///
/// Returns an error if JSON output was requested and cannot be rendered.
pub fn list(ctx: &ShopContext, json: bool) -> Result<(), CliError> {
    let entries = ctx.favorites().entries();
    if json {
        info!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        info!("No favorites");
        return Ok(());
    }
    let currency = ctx.cart().currency();
    for entry in &entries {
        info!(
            "  {}  {}  added {}  [{}]",
            entry.name,
            entry.price.display(currency),
            entry.added_date,
            entry.id
        );
    }
    info!("Favorites: {}", entries.len());
    Ok(())
}

/// Move a favorite into the cart.
///
/// # Errors
///
/// Returns `CliError::NotFavorite` if `id` is not a favorite.
pub fn to_cart(ctx: &ShopContext, id: &ProductId, qty: i64) -> Result<(), CliError> {
    if !ctx.favorites().move_to_cart(id, ctx.cart(), qty) {
        return Err(CliError::NotFavorite(id.clone()));
    }
    ctx.notifier().success(format!("Moved {id} to cart"));
    Ok(())
}
