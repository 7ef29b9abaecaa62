//! CLI command implementations.

pub mod cart;
pub mod favorites;
pub mod upload;

use shopstate_core::ProductId;
use shopstate_engine::{EngineConfig, EngineError, NoticeLevel, ShopContext};
use thiserror::Error;
use tracing::{error, info, warn};

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// No storage directory was given.
    #[error("no data directory: pass --data-dir or set SHOPSTATE_DATA_DIR")]
    NoDataDir,

    /// The product is not in the cart.
    #[error("{0} is not in the cart")]
    NotInCart(ProductId),

    /// The product is not a favorite.
    #[error("{0} is not a favorite")]
    NotFavorite(ProductId),

    /// JSON output could not be produced.
    #[error("cannot render JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// An engine operation failed.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Open a context that persists to disk.
///
/// # Errors
///
/// Returns an error if no data directory is configured or it cannot be opened.
pub fn open_durable(config: EngineConfig) -> Result<ShopContext, CliError> {
    if config.data_dir.is_none() {
        return Err(CliError::NoDataDir);
    }
    Ok(ShopContext::open(config)?)
}

/// Log pending notices and dispose of the context.
pub fn finish(ctx: ShopContext) {
    for notice in ctx.notifier().drain() {
        match notice.level {
            NoticeLevel::Success | NoticeLevel::Info => info!("{}", notice.message),
            NoticeLevel::Error => error!("{}", notice.message),
        }
    }
    if ctx.config().data_dir.is_some() && !ctx.store().is_durable() {
        warn!("Storage degraded to session-only; changes were not saved");
    }
    ctx.dispose();
}
