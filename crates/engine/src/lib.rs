//! Shopstate engine.
//!
//! Client-side shopping state: a persisted cart and favorites list over a
//! pluggable key-value store, counters kept in step with them, transient
//! feedback notices, and an infinite carousel state machine.
//!
//! Start from [`ShopContext`], which wires every part together for one page
//! or tab.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod carousel;
pub mod cart;
pub mod clock;
pub mod collection;
pub mod config;
pub mod context;
pub mod error;
pub mod favorites;
pub mod feed;
pub mod indicator;
pub mod notifier;
pub mod store;
pub mod upload;

pub use cart::{CartLine, CartManager, CartSummary};
pub use config::{ConfigError, EngineConfig};
pub use context::ShopContext;
pub use error::{EngineError, Result};
pub use favorites::{FavoriteEntry, FavoritesManager};
pub use indicator::{Indicator, IndicatorMetric};
pub use notifier::{Notice, NoticeLevel, Notifier};
pub use store::{JsonStore, PersistentStore, StoreError};
