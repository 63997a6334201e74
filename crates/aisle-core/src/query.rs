//! Filter, sort and request-parameter types for product queries.
//!
//! Serialization rules the backend relies on:
//!
//! - Blank filter fields are omitted entirely, never sent as `key=`. Clearing
//!   a filter therefore produces exactly the parameters of never having set it.
//! - [`SortKey::Latest`] omits `sort` so the backend applies its default
//!   (`-created_at`). Every other key maps to one backend token.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Structured facet selection applied to a product query.
///
/// Each field is an optional constraint; `None` and blank strings both mean
/// "unconstrained".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub item_type: Option<String>,
    #[serde(default)]
    pub skin_type: Option<String>,
    #[serde(default)]
    pub concern: Option<String>,
}

impl FilterSet {
    /// Query parameter keys, in the order they are serialized.
    pub const KEYS: [&'static str; 4] = ["category", "item_type", "skin_type", "concern"];

    /// Creates an empty filter set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, value: impl Into<String>) -> Self {
        self.category = Some(value.into());
        self
    }

    pub fn with_item_type(mut self, value: impl Into<String>) -> Self {
        self.item_type = Some(value.into());
        self
    }

    pub fn with_skin_type(mut self, value: impl Into<String>) -> Self {
        self.skin_type = Some(value.into());
        self
    }

    pub fn with_concern(mut self, value: impl Into<String>) -> Self {
        self.concern = Some(value.into());
        self
    }

    /// Sets a facet by its query parameter key. A blank value clears it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` for an unknown key.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        let slot = match key {
            "category" => &mut self.category,
            "item_type" => &mut self.item_type,
            "skin_type" => &mut self.skin_type,
            "concern" => &mut self.concern,
            _ => return Err(unknown_filter(key)),
        };
        let value = value.trim();
        *slot = (!value.is_empty()).then(|| value.to_string());
        Ok(())
    }

    /// Returns true if no facet constrains the query.
    pub fn is_empty(&self) -> bool {
        self.to_params().is_empty()
    }

    /// Converts the set into query parameters, omitting blank fields.
    ///
    /// # Examples
    ///
    /// ```
    /// use aisle_core::query::FilterSet;
    ///
    /// let filters = FilterSet::new().with_skin_type("oily").with_concern("  ");
    /// assert_eq!(filters.to_params(), vec![("skin_type", "oily".to_string())]);
    /// ```
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let fields = [
            &self.category,
            &self.item_type,
            &self.skin_type,
            &self.concern,
        ];
        Self::KEYS
            .iter()
            .zip(fields)
            .filter_map(|(key, value)| {
                value
                    .as_deref()
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(|v| (*key, v.to_string()))
            })
            .collect()
    }
}

pub(crate) fn unknown_filter(key: &str) -> AppError {
    AppError::ConfigError(format!(
        "Unknown filter: '{}'. Valid options: {}",
        key,
        FilterSet::KEYS.join(", ")
    ))
}

/// Result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Newest first; the backend default.
    #[default]
    Latest,
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
}

impl SortKey {
    /// All sort keys, in the order a sort picker lists them.
    pub const ALL: [SortKey; 5] = [
        SortKey::Latest,
        SortKey::PriceAsc,
        SortKey::PriceDesc,
        SortKey::NameAsc,
        SortKey::NameDesc,
    ];

    /// Backend `sort` token, or `None` when the parameter must be omitted.
    pub fn as_token(&self) -> Option<&'static str> {
        match self {
            SortKey::Latest => None,
            SortKey::PriceAsc => Some("price"),
            SortKey::PriceDesc => Some("-price"),
            SortKey::NameAsc => Some("name"),
            SortKey::NameDesc => Some("-name"),
        }
    }

    /// Identifier used in configuration and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Latest => "latest",
            SortKey::PriceAsc => "price_asc",
            SortKey::PriceDesc => "price_desc",
            SortKey::NameAsc => "name_asc",
            SortKey::NameDesc => "name_desc",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "latest" => Ok(Self::Latest),
            "price_asc" => Ok(Self::PriceAsc),
            "price_desc" => Ok(Self::PriceDesc),
            "name_asc" => Ok(Self::NameAsc),
            "name_desc" => Ok(Self::NameDesc),
            _ => Err(AppError::ConfigError(format!(
                "Unknown sort key: '{}'. Valid options: latest, price_asc, price_desc, name_asc, name_desc",
                s
            ))),
        }
    }
}

/// Everything needed to request one page from the product search API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub query: String,
    pub filters: FilterSet,
    pub sort: SortKey,
    pub page: u32,
    pub per_page: u32,
}

impl ProductQuery {
    /// Serializes the query as `GET /products` parameters.
    ///
    /// Order: `q`, `page`, `per_page`, `sort` (if any), then filters.
    ///
    /// # Examples
    ///
    /// ```
    /// use aisle_core::query::{FilterSet, ProductQuery, SortKey};
    ///
    /// let query = ProductQuery {
    ///     query: " soap ".to_string(),
    ///     filters: FilterSet::new().with_item_type("cleanser"),
    ///     sort: SortKey::PriceDesc,
    ///     page: 2,
    ///     per_page: 20,
    /// };
    /// let params = query.to_params();
    /// assert_eq!(params[0], ("q", "soap".to_string()));
    /// assert_eq!(params[3], ("sort", "-price".to_string()));
    /// assert_eq!(params[4], ("item_type", "cleanser".to_string()));
    /// ```
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("q", self.query.trim().to_string()),
            ("page", self.page.to_string()),
            ("per_page", self.per_page.to_string()),
        ];
        if let Some(token) = self.sort.as_token() {
            params.push(("sort", token.to_string()));
        }
        params.extend(self.filters.to_params());
        params
    }
}
