use thiserror::Error;

/// Application-wide error types.
///
/// This enum represents every failure the search stack can observe, from
/// transport problems talking to the storefront API to configuration mistakes.
/// It uses the `thiserror` crate for ergonomic error handling.
///
/// # Error Conversion
///
/// - `serde_json::Error` → `AppError::SerializationError`
///
/// HTTP client errors are classified by the client crate into
/// [`AppError::Timeout`], [`AppError::NetworkError`] or [`AppError::ClientError`]
/// so that this crate does not depend on a particular HTTP stack.
///
/// # Examples
///
/// ```
/// use aisle_core::error::AppError;
///
/// fn example() -> Result<(), AppError> {
///     Err(AppError::Generic("Something went wrong".to_string()))
/// }
/// assert!(example().is_err());
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed or returned a non-success status.
    ///
    /// The response body of a failed request is never parsed; the message
    /// only carries the status code and URL.
    #[error("API Client error: {0}")]
    ClientError(String),

    /// JSON serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// URL construction failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The configured storefront base URL cannot be parsed.
    #[error("Invalid storefront URL: {0}")]
    InvalidBaseUrl(String),

    /// Network or connection error.
    ///
    /// No response was received: DNS failure, refused connection, reset.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request timeout.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// The storefront answered with HTTP 429.
    #[error("Rate limit exceeded. Please wait and try again.")]
    RateLimitExceeded,

    /// Configuration file or value error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The search session has shut down and no longer accepts input.
    #[error("Search session is closed")]
    SessionClosed,

    /// Generic application error for cases not covered by specific variants.
    #[error("Error: {0}")]
    Generic(String),
}

impl AppError {
    /// Returns a user-friendly error message suitable for display next to a
    /// retry affordance.
    pub fn user_message(&self) -> String {
        match self {
            AppError::ClientError(msg) => {
                if msg.contains("HTTP 5") {
                    "The store is having trouble right now. Please try again.".to_string()
                } else {
                    format!("Could not load products: {}", msg)
                }
            }
            AppError::NetworkError(_) => {
                "No connection. Check your internet connection and try again.".to_string()
            }
            AppError::Timeout(secs) => {
                format!(
                    "The request timed out after {} seconds. Please try again.",
                    secs
                )
            }
            AppError::RateLimitExceeded => {
                "Too many requests. Please wait a moment and try again.".to_string()
            }
            AppError::SerializationError(_) => {
                "The store sent a response we could not read.".to_string()
            }
            AppError::ConfigError(msg) => {
                format!(
                    "Configuration error: {}\n   Check your configuration file.",
                    msg
                )
            }
            AppError::InvalidBaseUrl(url) => {
                format!(
                    "Invalid storefront URL: {}\n   Example: https://shop.example.com/api",
                    url
                )
            }
            _ => self.to_string(),
        }
    }

    /// Returns true if retrying the same request may succeed.
    ///
    /// Retries are always user initiated; this only decides whether a retry
    /// affordance is worth offering.
    ///
    /// # Examples
    ///
    /// ```
    /// use aisle_core::error::AppError;
    ///
    /// let err = AppError::NetworkError("connection reset".to_string());
    /// assert!(err.is_retryable());
    ///
    /// let err = AppError::ConfigError("per_page must be positive".to_string());
    /// assert!(!err.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::NetworkError(_)
                | AppError::Timeout(_)
                | AppError::RateLimitExceeded
                | AppError::ClientError(_)
        )
    }
}
