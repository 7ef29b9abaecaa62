//! Engine configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `SHOPSTATE_DATA_DIR` - Directory for durable storage (default: memory only)
//! - `SHOPSTATE_CART_KEY` - Storage key of the cart (default: cart)
//! - `SHOPSTATE_FAVORITES_KEY` - Storage key of the favorites (default: favorites)
//! - `SHOPSTATE_CURRENCY` - Display currency (default: USD)
//! - `SHOPSTATE_NOTICE_TTL_MS` - Lifetime of feedback notices (default: 3000)
//! - `SHOPSTATE_CAROUSEL_TRANSITION_MS` - Carousel transition lock (default: 500)
//! - `SHOPSTATE_CAROUSEL_AUTOPLAY_MS` - Carousel autoplay interval, 0 disables (default: 5000)
//! - `SHOPSTATE_UPLOAD_URL` - Image upload endpoint
//! - `SHOPSTATE_LOG_JSON` - Emit JSON logs from binaries (default: false)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use shopstate_core::CurrencyCode;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Shopping state engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Directory for durable storage; `None` keeps everything in memory
    pub data_dir: Option<PathBuf>,
    /// Storage key names
    pub keys: StorageKeys,
    /// Currency used when formatting prices
    pub currency: CurrencyCode,
    /// How long a feedback notice stays visible
    pub notice_ttl: Duration,
    /// Carousel timing
    pub carousel: CarouselConfig,
    /// Image upload endpoint
    pub upload_url: Option<Url>,
    /// Whether binaries should log JSON
    pub log_json: bool,
}

/// Storage keys of the persisted collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub cart: String,
    pub favorites: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            cart: "cart".to_string(),
            favorites: "favorites".to_string(),
        }
    }
}

/// Carousel timer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarouselConfig {
    /// How long a transition holds the input lock
    pub transition: Duration,
    /// Autoplay interval; `None` disables autoplay
    pub autoplay: Option<Duration>,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            transition: Duration::from_millis(500),
            autoplay: Some(Duration::from_millis(5000)),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            keys: StorageKeys::default(),
            currency: CurrencyCode::default(),
            notice_ttl: Duration::from_millis(3000),
            carousel: CarouselConfig::default(),
            upload_url: None,
            log_json: false,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let defaults = Self::default();

        let data_dir = get_optional_env("SHOPSTATE_DATA_DIR").map(PathBuf::from);
        let keys = StorageKeys {
            cart: get_env_or_default("SHOPSTATE_CART_KEY", &defaults.keys.cart),
            favorites: get_env_or_default("SHOPSTATE_FAVORITES_KEY", &defaults.keys.favorites),
        };
        let currency = get_parsed_env("SHOPSTATE_CURRENCY")?.unwrap_or(defaults.currency);
        let notice_ttl =
            get_millis_env("SHOPSTATE_NOTICE_TTL_MS")?.unwrap_or(defaults.notice_ttl);
        let transition = get_millis_env("SHOPSTATE_CAROUSEL_TRANSITION_MS")?
            .unwrap_or(defaults.carousel.transition);
        let autoplay = match get_millis_env("SHOPSTATE_CAROUSEL_AUTOPLAY_MS")? {
            Some(interval) if interval.is_zero() => None,
            Some(interval) => Some(interval),
            None => defaults.carousel.autoplay,
        };
        let upload_url = get_optional_env("SHOPSTATE_UPLOAD_URL")
            .map(|raw| {
                Url::parse(&raw).map_err(|e| {
                    ConfigError::InvalidEnvVar("SHOPSTATE_UPLOAD_URL".to_string(), e.to_string())
                })
            })
            .transpose()?;
        let log_json = parse_bool(
            "SHOPSTATE_LOG_JSON",
            get_optional_env("SHOPSTATE_LOG_JSON").as_deref(),
        )?
        .unwrap_or(defaults.log_json);

        Ok(Self {
            data_dir,
            keys,
            currency,
            notice_ttl,
            carousel: CarouselConfig {
                transition,
                autoplay,
            },
            upload_url,
            log_json,
        })
    }

    /// Default configuration persisting under `dir`.
    #[must_use]
    pub fn with_data_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(dir.into()),
            ..Self::default()
        }
    }

    /// Get the upload endpoint, or an error naming the variable to set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if no endpoint is configured.
    pub fn require_upload_url(&self) -> Result<&Url, ConfigError> {
        self.upload_url
            .as_ref()
            .ok_or_else(|| ConfigError::MissingEnvVar("SHOPSTATE_UPLOAD_URL".to_string()))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating empty as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an optional environment variable with `FromStr`.
fn get_parsed_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
        .transpose()
}

/// Parse an optional millisecond duration.
fn get_millis_env(key: &str) -> Result<Option<Duration>, ConfigError> {
    Ok(get_parsed_env::<u64>(key)?.map(Duration::from_millis))
}

/// Parse a boolean flag value.
fn parse_bool(key: &str, raw: Option<&str>) -> Result<Option<bool>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}
