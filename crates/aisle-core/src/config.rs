//! Configuration types for Aisle components.
//!
//! Values are layered: built-in defaults, then an optional
//! `storefront.toml`, then environment variables, then command line flags
//! (applied by the binary).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::AppError;

/// Largest page size the storefront backend honours.
pub const MAX_PER_PAGE: u32 = 100;

/// Default number of products requested per page.
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Default quiet period before a typed query is sent.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(420);

/// Search controller tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Page size sent as `per_page`; also the "has more" threshold.
    pub per_page: u32,
    /// Trailing-edge debounce applied to query text changes.
    pub debounce: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

impl SearchConfig {
    /// Creates config from environment variables with fallback to defaults.
    ///
    /// Reads `AISLE_PER_PAGE` and `AISLE_DEBOUNCE_MS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            per_page: std::env::var("AISLE_PER_PAGE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.per_page),
            debounce: std::env::var("AISLE_DEBOUNCE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.debounce),
        }
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Checks that the page size is one the backend will honour.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.per_page == 0 || self.per_page > MAX_PER_PAGE {
            return Err(AppError::ConfigError(format!(
                "per_page must be between 1 and {}, got {}",
                MAX_PER_PAGE, self.per_page
            )));
        }
        Ok(())
    }
}

/// HTTP client configuration for storefront API calls.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("Aisle/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpConfig {
    /// Creates config from environment variables with fallback to defaults.
    ///
    /// Reads `AISLE_HTTP_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            timeout: std::env::var("AISLE_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            ..defaults
        }
    }
}

// =============================================================================
// Storefront Configuration (storefront.toml)
// =============================================================================

/// Contents of `storefront.toml`.
///
/// # Example
///
/// ```toml
/// base_url = "https://shop.example.com/api"
/// per_page = 20
/// debounce_ms = 420
/// timeout_secs = 30
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorefrontConfig {
    /// Base URL of the storefront API; `products` is resolved against it.
    pub base_url: Option<String>,
    pub per_page: Option<u32>,
    pub debounce_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
}

impl StorefrontConfig {
    /// Applies file values on top of `base`.
    pub fn search_config(&self, base: SearchConfig) -> SearchConfig {
        SearchConfig {
            per_page: self.per_page.unwrap_or(base.per_page),
            debounce: self
                .debounce_ms
                .map(Duration::from_millis)
                .unwrap_or(base.debounce),
        }
    }

    /// Applies file values on top of `base`.
    pub fn http_config(&self, base: HttpConfig) -> HttpConfig {
        HttpConfig {
            timeout: self
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(base.timeout),
            ..base
        }
    }
}

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "storefront.toml";

/// Returns the default configuration directory path: `~/.config/aisle/`.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("aisle"))
}

/// Returns the default configuration file path: `~/.config/aisle/storefront.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|p| p.join(CONFIG_FILE_NAME))
}

/// Load storefront configuration from a TOML file.
///
/// # Returns
/// * `Ok(Some(config))` - Configuration loaded successfully
/// * `Ok(None)` - No file at the default path (not an error)
/// * `Err(e)` - An explicit path is missing, or the file is invalid
pub fn load_storefront_config(path: Option<PathBuf>) -> Result<Option<StorefrontConfig>, AppError> {
    let using_default_path = path.is_none();
    let config_path = match path {
        Some(p) => p,
        None => match default_config_path() {
            Some(p) => p,
            None => return Ok(None),
        },
    };

    if !config_path.exists() {
        if using_default_path {
            tracing::debug!(
                path = %config_path.display(),
                "No storefront config found, using defaults"
            );
            return Ok(None);
        }
        return Err(AppError::ConfigError(format!(
            "Config file not found: {}",
            config_path.display()
        )));
    }

    parse_config_file(&config_path).map(Some)
}

fn parse_config_file(path: &Path) -> Result<StorefrontConfig, AppError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        AppError::ConfigError(format!(
            "Failed to read config file '{}': {}",
            path.display(),
            e
        ))
    })?;

    toml::from_str(&content).map_err(|e| {
        AppError::ConfigError(format!("Invalid TOML in '{}': {}", path.display(), e))
    })
}
