//! Unified error type for the engine.
//!
//! Collection operations never fail from the caller's point of view: storage
//! problems are logged and absorbed. `EngineError` covers the remaining
//! fallible edges: loading configuration, opening storage explicitly, and
//! uploading images.

use thiserror::Error;

use crate::config::ConfigError;
use crate::store::StoreError;
use crate::upload::UploadError;

/// Engine-level error type.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Storage could not be opened or written.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Image upload failed.
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
