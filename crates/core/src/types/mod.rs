//! Core types for the shopping state engine.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod product;
pub mod quantity;

pub use id::{ProductId, ProductIdError};
pub use price::{CurrencyCode, Price, PriceError};
pub use product::ProductRef;
pub use quantity::Quantity;
