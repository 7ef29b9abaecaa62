//! Per-context engine state.
//!
//! A [`ShopContext`] is what one page or tab owns: a storage handle, a change
//! feed, the cart and favorites managers, and a notifier. Contexts built over
//! the same storage directory share persisted data but not change
//! notifications.

use std::sync::Arc;

use chrono::TimeDelta;
use tracing::{info, instrument, warn};

use crate::cart::{CartLine, CartManager};
use crate::carousel::{Carousel, CarouselDriver};
use crate::clock::{Clock, SystemClock};
use crate::collection::{CollectionKind, CollectionManager};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::favorites::{FavoriteEntry, FavoritesManager};
use crate::feed::ChangeFeed;
use crate::indicator::{Indicator, IndicatorMetric};
use crate::notifier::Notifier;
use crate::store::{FallbackStore, FileStore, JsonStore, MemoryStore, PersistentStore};
use crate::upload::{HttpImageUploader, UploadFile, upload_with_feedback};

/// Engine state for one page or tab.
///
/// This struct is cheaply cloneable via `Arc`. Clones are the same context:
/// they share the change feed and notifier.
#[derive(Debug, Clone)]
pub struct ShopContext {
    inner: Arc<ShopContextInner>,
}

#[derive(Debug)]
struct ShopContextInner {
    config: EngineConfig,
    store: JsonStore,
    feed: ChangeFeed,
    cart: CartManager,
    favorites: FavoritesManager,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
}

impl ShopContext {
    /// Create a context, degrading to session-only storage if needed.
    ///
    /// With `data_dir` set, storage is a [`FileStore`] wrapped in a
    /// [`FallbackStore`]. If the directory cannot be opened the context
    /// starts in memory and logs a warning. Without `data_dir`, storage is
    /// memory only.
    #[must_use]
    pub fn init(config: EngineConfig) -> Self {
        let backend: Arc<dyn PersistentStore> = match &config.data_dir {
            Some(dir) => match FileStore::open(dir) {
                Ok(files) => Arc::new(FallbackStore::new(files)),
                Err(e) => {
                    warn!(
                        dir = %dir.display(),
                        error = %e,
                        "Cannot open data directory, continuing with session-only storage"
                    );
                    Arc::new(MemoryStore::new())
                }
            },
            None => Arc::new(MemoryStore::new()),
        };
        Self::with_store(config, backend, Arc::new(SystemClock))
    }

    /// Create a context that requires durable storage.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Store` if `data_dir` is set and cannot be opened.
    pub fn open(config: EngineConfig) -> Result<Self> {
        let backend: Arc<dyn PersistentStore> = match &config.data_dir {
            Some(dir) => Arc::new(FallbackStore::new(FileStore::open(dir)?)),
            None => Arc::new(MemoryStore::new()),
        };
        Ok(Self::with_store(config, backend, Arc::new(SystemClock)))
    }

    /// Create a context over an explicit backend and clock.
    #[must_use]
    pub fn with_store(
        config: EngineConfig,
        backend: Arc<dyn PersistentStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = JsonStore::new(backend);
        let feed = ChangeFeed::default();

        let cart = CartManager::new(
            CollectionManager::<CartLine>::new(
                store.clone(),
                config.keys.cart.as_str(),
                CollectionKind::Cart,
                feed.clone(),
            ),
            config.currency,
        );
        let favorites = FavoritesManager::new(
            CollectionManager::<FavoriteEntry>::new(
                store.clone(),
                config.keys.favorites.as_str(),
                CollectionKind::Favorites,
                feed.clone(),
            ),
            Arc::clone(&clock),
        );
        let notice_ttl = TimeDelta::from_std(config.notice_ttl).unwrap_or(TimeDelta::MAX);
        let notifier = Notifier::new(notice_ttl, Arc::clone(&clock));

        info!(durable = store.is_durable(), "Shop context initialized");

        Self {
            inner: Arc::new(ShopContextInner {
                config,
                store,
                feed,
                cart,
                favorites,
                notifier,
                clock,
            }),
        }
    }

    /// Get a reference to the engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Get a reference to the typed store.
    #[must_use]
    pub fn store(&self) -> &JsonStore {
        &self.inner.store
    }

    /// Get a reference to this context's change feed.
    #[must_use]
    pub fn feed(&self) -> &ChangeFeed {
        &self.inner.feed
    }

    /// Get a reference to the cart.
    #[must_use]
    pub fn cart(&self) -> &CartManager {
        &self.inner.cart
    }

    /// Get a reference to the favorites.
    #[must_use]
    pub fn favorites(&self) -> &FavoritesManager {
        &self.inner.favorites
    }

    /// Get a reference to the notifier.
    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    /// Get a reference to the clock.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.inner.clock
    }

    /// Cart item count badge.
    #[must_use]
    pub fn cart_badge(&self) -> Indicator<CartManager> {
        Indicator::new(self.cart().clone(), IndicatorMetric::ItemCount, self.feed())
    }

    /// Cart total in minor units.
    #[must_use]
    pub fn cart_total_indicator(&self) -> Indicator<CartManager> {
        Indicator::new(self.cart().clone(), IndicatorMetric::Total, self.feed())
    }

    /// Favorites count badge.
    #[must_use]
    pub fn favorites_badge(&self) -> Indicator<FavoritesManager> {
        Indicator::new(
            self.favorites().clone(),
            IndicatorMetric::ItemCount,
            self.feed(),
        )
    }

    /// Start a carousel over `len` slides using the configured timings.
    ///
    /// Must be called inside a Tokio runtime.
    #[must_use]
    pub fn carousel(&self, len: usize, visible: usize) -> CarouselDriver {
        let timing = self.config().carousel;
        CarouselDriver::start(Carousel::new(len, visible), timing.transition, timing.autoplay)
    }

    /// Upload images to the configured endpoint, reporting through the notifier.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Config` if no endpoint is configured, or
    /// `EngineError::Upload` if the upload fails.
    #[instrument(skip(self, files), fields(count = files.len()))]
    pub async fn upload_images(&self, files: Vec<UploadFile>) -> Result<Vec<String>> {
        let endpoint = self.config().require_upload_url()?.clone();
        let uploader = HttpImageUploader::new(endpoint);
        Ok(upload_with_feedback(&uploader, self.notifier(), files).await?)
    }

    /// Tear the context down.
    ///
    /// Pending notices are discarded. Persisted collections are untouched.
    pub fn dispose(self) {
        let discarded = self.inner.notifier.drain().len();
        info!(discarded, "Shop context disposed");
    }
}
