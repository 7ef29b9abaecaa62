//! Shopstate Core - Shared types library.
//!
//! This crate provides the value types used across the shopping state engine:
//! - `engine` - Cart, favorites, indicators and the carousel state machine
//! - `cli` - Command-line driver over a file-backed store
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access, no HTTP
//! clients. Catalog data enters the engine as a [`ProductRef`] and is copied
//! into collection entries at insertion time.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product IDs, prices, quantities and catalog products

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
