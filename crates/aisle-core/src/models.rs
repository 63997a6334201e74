//! Domain models returned by the product search API.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::query::unknown_filter;

fn default_currency() -> String {
    "LKR".to_string()
}

/// A product as listed by `GET /products`.
///
/// Only `id`, `name` and `price` are guaranteed by the backend; everything
/// else is optional and unknown fields are ignored.
///
/// # Examples
///
/// ```
/// use aisle_core::models::Product;
///
/// let json = r#"{"id": "p-1", "name": "Rice Water Toner", "price": 2450}"#;
/// let product: Product = serde_json::from_str(json).unwrap();
/// assert_eq!(product.currency, "LKR");
/// assert_eq!(product.stock, 0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    pub price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub hero_image: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub item_type: Option<String>,
}

impl Product {
    /// Formats the price the way listing tiles show it, e.g. `LKR 2,450.00`.
    pub fn display_price(&self) -> String {
        let cents = (self.price * 100.0).round() as i64;
        let whole = cents / 100;
        let frac = (cents % 100).abs();

        let digits = whole.abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }
        let sign = if cents < 0 { "-" } else { "" };

        format!("{} {}{}.{:02}", self.currency, sign, grouped, frac)
    }
}

/// One page of results from the product search API.
///
/// The backend echoes `page` and `per_page` but provides no total count,
/// which is why pagination relies on the page-length heuristic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    pub items: Vec<Product>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

impl ProductPage {
    /// Creates a page containing the given items.
    pub fn new(items: Vec<Product>) -> Self {
        Self {
            items,
            page: None,
            per_page: None,
        }
    }

    /// Number of products on this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the page has no products.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Filter vocabularies
// =============================================================================

/// A category as listed by `GET /categories`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    /// Item types offered under this category, e.g. `toner`.
    #[serde(default)]
    pub item_types: Vec<String>,
}

/// Body of `GET /categories`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryList {
    pub items: Vec<Category>,
}

/// A keyed attribute value such as a skin type or a concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    #[serde(default)]
    pub label: Option<String>,
}

/// Body of `GET /attributes`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceAttributes {
    #[serde(default)]
    pub skin_types: Vec<Attribute>,
    #[serde(default)]
    pub concerns: Vec<Attribute>,
}

/// The values each filter key accepts, as published by the storefront.
///
/// A key whose vocabulary is empty accepts any value, since the backend
/// may simply not have been seeded.
///
/// # Examples
///
/// ```
/// use aisle_core::models::{Attribute, CategoryList, FaceAttributes, Facets};
///
/// let attributes = FaceAttributes {
///     skin_types: vec![Attribute { key: "dry_skin".to_string(), label: None }],
///     concerns: vec![],
/// };
/// let facets = Facets::new(CategoryList::default(), attributes);
/// assert!(facets.check("skin_type", "dry_skin").is_ok());
/// assert!(facets.check("skin_type", "dry").is_err());
/// assert!(facets.check("concern", "anything").is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Facets {
    pub categories: Vec<Category>,
    pub skin_types: Vec<Attribute>,
    pub concerns: Vec<Attribute>,
}

impl Facets {
    pub fn new(categories: CategoryList, attributes: FaceAttributes) -> Self {
        Self {
            categories: categories.items,
            skin_types: attributes.skin_types,
            concerns: attributes.concerns,
        }
    }

    /// Values accepted for `key`, in storefront order without duplicates.
    ///
    /// Categories are listed by id, which the backend matches exactly.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` for a key that is not a filter.
    pub fn choices(&self, key: &str) -> Result<Vec<&str>, AppError> {
        let values: Vec<&str> = match key {
            "category" => self.categories.iter().map(|c| c.id.as_str()).collect(),
            "item_type" => {
                let mut seen = Vec::new();
                for item_type in self.categories.iter().flat_map(|c| &c.item_types) {
                    if !seen.contains(&item_type.as_str()) {
                        seen.push(item_type.as_str());
                    }
                }
                seen
            }
            "skin_type" => self.skin_types.iter().map(|a| a.key.as_str()).collect(),
            "concern" => self.concerns.iter().map(|a| a.key.as_str()).collect(),
            other => return Err(unknown_filter(other)),
        };
        Ok(values)
    }

    /// Checks that `value` is one of the published choices for `key`.
    ///
    /// Blank values clear a filter and are always accepted. A category may
    /// also be named by slug or display name.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` for an unknown key or a value outside
    /// a non-empty vocabulary.
    pub fn check(&self, key: &str, value: &str) -> Result<(), AppError> {
        let choices = self.choices(key)?;
        let value = value.trim();
        if value.is_empty() || choices.is_empty() || choices.contains(&value) {
            return Ok(());
        }
        if key == "category"
            && self.categories.iter().any(|c| {
                c.slug.as_deref() == Some(value) || c.name.as_deref() == Some(value)
            })
        {
            return Ok(());
        }
        Err(AppError::ConfigError(format!(
            "Unknown {} '{}'. Choices: {}",
            key,
            value,
            choices.join(", ")
        )))
    }
}
