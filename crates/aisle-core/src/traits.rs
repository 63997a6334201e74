//! Trait definitions for external dependencies.
//!
//! The search session never talks HTTP directly; it depends on
//! [`ProductSearchApi`], enabling:
//!
//! - **Testability**: scripted mocks that resolve responses in any order
//! - **Decoupling**: the controller does not depend on a particular HTTP stack
//!
//! # Example
//!
//! ```
//! use aisle_core::traits::ProductSearchApi;
//! use aisle_core::query::{FilterSet, ProductQuery, SortKey};
//!
//! async fn first_page<A: ProductSearchApi>(api: &A, text: &str) -> usize {
//!     let query = ProductQuery {
//!         query: text.to_string(),
//!         filters: FilterSet::new(),
//!         sort: SortKey::Latest,
//!         page: 1,
//!         per_page: 20,
//!     };
//!     api.search(&query).await.map(|page| page.len()).unwrap_or(0)
//! }
//! ```

use std::future::Future;

use crate::error::AppError;
use crate::models::ProductPage;
use crate::query::ProductQuery;

/// Client for the storefront's product collection endpoint.
///
/// Implementations perform exactly one request per call and never retry on
/// their own; retries are a user decision.
pub trait ProductSearchApi: Send + Sync + Clone + 'static {
    /// Fetches one page of products matching `query`.
    ///
    /// # Errors
    ///
    /// Transport failures and non-2xx responses are both reported as errors;
    /// the session treats them identically.
    fn search(
        &self,
        query: &ProductQuery,
    ) -> impl Future<Output = Result<ProductPage, AppError>> + Send;
}
