//! Storefront client for the product collection endpoint.
//!
//! The storefront exposes a listing route and two vocabulary routes that
//! feed the filter sheet:
//!
//! ```text
//! GET {base}/products?q=..&page=..&per_page=..[&sort=..][&category=..]...
//! -> {"items": [...], "page": 1, "per_page": 20}
//! GET {base}/categories -> {"items": [{"id", "name", "slug", "item_types"}]}
//! GET {base}/attributes -> {"skin_types": [{"key", "label"}], "concerns": [...]}
//! ```
//!
//! There is no total count in the response; see
//! [`aisle_core::SearchController`] for how "has more" is derived.

use aisle_core::error::AppError;
use aisle_core::models::{CategoryList, FaceAttributes, Facets, ProductPage};
use aisle_core::query::ProductQuery;
use aisle_core::traits::ProductSearchApi;
use aisle_core::HttpConfig;
use reqwest::{Client, Response, StatusCode, Url};
use tracing::debug;

/// HTTP client for a storefront's product search API.
///
/// # Examples
///
/// ```no_run
/// use aisle_client::StorefrontClient;
/// use aisle_core::{FilterSet, ProductQuery, SortKey};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = StorefrontClient::new("https://shop.example.com/api")?;
/// let query = ProductQuery {
///     query: "niacinamide".to_string(),
///     filters: FilterSet::new().with_skin_type("oily"),
///     sort: SortKey::PriceAsc,
///     page: 1,
///     per_page: 20,
/// };
/// let page = client.search_products(&query).await?;
/// println!("Found {} products", page.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct StorefrontClient {
    client: Client,
    base_url: Url,
    timeout_secs: u64,
}

impl StorefrontClient {
    /// Paths relative to the base URL.
    const PRODUCTS_PATH: &'static str = "products";
    const CATEGORIES_PATH: &'static str = "categories";
    const ATTRIBUTES_PATH: &'static str = "attributes";

    /// Creates a client with the default [`HttpConfig`].
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidBaseUrl` if the URL is invalid or malformed.
    /// Returns `AppError::ClientError` if the HTTP client cannot be built.
    pub fn new(base_url_str: &str) -> Result<Self, AppError> {
        Self::with_config(base_url_str, &HttpConfig::default())
    }

    /// Creates a client with explicit HTTP settings.
    ///
    /// The base URL may carry a path prefix (`https://host/api`); it is
    /// normalized to end with `/` so the products route resolves beneath it.
    pub fn with_config(base_url_str: &str, http_config: &HttpConfig) -> Result<Self, AppError> {
        let mut base_url = Url::parse(base_url_str.trim())
            .map_err(|_| AppError::InvalidBaseUrl(base_url_str.to_string()))?;

        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(AppError::InvalidBaseUrl(base_url_str.to_string()));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .user_agent(http_config.user_agent.as_str())
            .timeout(http_config.timeout)
            .build()
            .map_err(|e| AppError::ClientError(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            timeout_secs: http_config.timeout.as_secs(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds the full request URL for `query`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidUrl` if the products route cannot be joined
    /// to the base URL.
    pub fn products_url(&self, query: &ProductQuery) -> Result<Url, AppError> {
        let mut url = self.endpoint(Self::PRODUCTS_PATH)?;

        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query.to_params() {
                pairs.append_pair(key, &value);
            }
        }

        Ok(url)
    }

    /// Fetches one page of products.
    ///
    /// Exactly one request is made; retrying is left to the user.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Timeout` if the request timed out.
    /// Returns `AppError::NetworkError` if the storefront could not be reached.
    /// Returns `AppError::RateLimitExceeded` on HTTP 429.
    /// Returns `AppError::ClientError` on any other non-2xx status or an
    /// unparseable body.
    pub async fn search_products(&self, query: &ProductQuery) -> Result<ProductPage, AppError> {
        let url = self.products_url(query)?;
        debug!(%url, "Requesting product page");

        let resp = self.request(&url).await?;
        let page: ProductPage = resp
            .json()
            .await
            .map_err(|e| self.map_body_error(e, "product page", &url))?;

        debug!(count = page.len(), page = ?page.page, "Product page received");
        Ok(page)
    }

    /// Fetches the filter vocabularies from `/categories` and `/attributes`.
    ///
    /// # Errors
    ///
    /// Same mapping as [`StorefrontClient::search_products`], for whichever
    /// of the two requests fails first.
    pub async fn facets(&self) -> Result<Facets, AppError> {
        let url = self.endpoint(Self::CATEGORIES_PATH)?;
        let categories: CategoryList = self
            .request(&url)
            .await?
            .json()
            .await
            .map_err(|e| self.map_body_error(e, "category list", &url))?;

        let url = self.endpoint(Self::ATTRIBUTES_PATH)?;
        let attributes: FaceAttributes = self
            .request(&url)
            .await?
            .json()
            .await
            .map_err(|e| self.map_body_error(e, "attribute list", &url))?;

        debug!(
            categories = categories.items.len(),
            skin_types = attributes.skin_types.len(),
            concerns = attributes.concerns.len(),
            "Facets received"
        );
        Ok(Facets::new(categories, attributes))
    }

    fn endpoint(&self, path: &str) -> Result<Url, AppError> {
        self.base_url
            .join(path)
            .map_err(|e| AppError::InvalidUrl(e.to_string()))
    }

    /// Sends one GET and maps non-2xx statuses. The body of an error
    /// response is ignored.
    async fn request(&self, url: &Url) -> Result<Response, AppError> {
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::RateLimitExceeded);
        }
        if !status.is_success() {
            return Err(AppError::ClientError(format!(
                "HTTP {} from {}",
                status.as_u16(),
                url
            )));
        }
        Ok(resp)
    }

    fn map_body_error(&self, e: reqwest::Error, what: &str, url: &Url) -> AppError {
        if e.is_timeout() {
            AppError::Timeout(self.timeout_secs)
        } else {
            AppError::ClientError(format!("Invalid {} from {}: {}", what, url, e))
        }
    }

    fn map_transport_error(&self, e: reqwest::Error) -> AppError {
        if e.is_timeout() {
            AppError::Timeout(self.timeout_secs)
        } else if e.is_connect() {
            AppError::NetworkError(format!("Connection failed: {}", e))
        } else if e.is_request() {
            AppError::NetworkError(e.to_string())
        } else {
            AppError::ClientError(e.to_string())
        }
    }
}

impl ProductSearchApi for StorefrontClient {
    async fn search(&self, query: &ProductQuery) -> Result<ProductPage, AppError> {
        self.search_products(query).await
    }
}
