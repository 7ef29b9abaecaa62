//! Integration tests for the shopstate engine.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopstate-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `durability` - Collections surviving a context being torn down
//! - `cross_context` - Two contexts sharing one data directory
//! - `scenarios` - End-to-end cart and favorites flows
//! - `carousel` - Carousel timers driven through a context
//!
//! Every test gets its own temporary data directory, so tests can run in
//! parallel.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::Path;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use shopstate_core::{Price, ProductId, ProductRef};
use shopstate_engine::clock::FixedClock;
use shopstate_engine::store::{FallbackStore, FileStore};
use shopstate_engine::{EngineConfig, ShopContext};
use tempfile::TempDir;

/// A temporary data directory that contexts can be opened over.
///
/// The directory is deleted when the harness is dropped.
pub struct TestHarness {
    dir: TempDir,
    clock: Arc<FixedClock>,
}

impl TestHarness {
    /// Create an empty data directory with a clock fixed at 2024-05-17 10:00 UTC.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        let start = Utc
            .with_ymd_and_hms(2024, 5, 17, 10, 0, 0)
            .single()
            .expect("valid start time");
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
            clock: Arc::new(FixedClock::new(start)),
        }
    }

    /// The data directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Shared test clock.
    #[must_use]
    pub fn clock(&self) -> &Arc<FixedClock> {
        &self.clock
    }

    /// Configuration pointing at the data directory.
    #[must_use]
    pub fn config(&self) -> EngineConfig {
        EngineConfig::with_data_dir(self.path())
    }

    /// Open a new context (one "tab") over the data directory.
    ///
    /// # Panics
    ///
    /// Panics if the data directory cannot be opened.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn open_context(&self) -> ShopContext {
        let files = FileStore::open(self.path()).expect("open file store");
        ShopContext::with_store(
            self.config(),
            Arc::new(FallbackStore::new(files)),
            self.clock.clone(),
        )
    }

    /// Overwrite the raw file backing `key`.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    #[allow(clippy::expect_used)]
    pub fn write_raw(&self, key: &str, contents: &str) {
        std::fs::write(self.path().join(format!("{key}.json")), contents)
            .expect("write raw value");
    }

    /// Read the raw file backing `key`, if present.
    #[must_use]
    pub fn read_raw(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path().join(format!("{key}.json"))).ok()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a catalog product priced in minor units.
///
/// # Panics
///
/// Panics if `id` is blank.
#[must_use]
#[allow(clippy::expect_used)]
pub fn product(id: &str, price: i64) -> ProductRef {
    ProductRef::new(
        ProductId::parse(id).expect("non-empty product id"),
        format!("Product {id}"),
        Price::from_minor(price),
    )
}

/// Parse a product ID.
///
/// # Panics
///
/// Panics if `id` is blank.
#[must_use]
#[allow(clippy::expect_used)]
pub fn pid(id: &str) -> ProductId {
    ProductId::parse(id).expect("non-empty product id")
}
