//! Aisle Client - HTTP client for the storefront API
//!
//! This crate provides the HTTP implementation of
//! [`aisle_core::ProductSearchApi`]:
//!
//! - [`storefront`] - the storefront's `GET /products` listing endpoint
//!
//! # Overview
//!
//! The client handles request building, response parsing and error mapping.
//! It never retries; a failed page is surfaced to the search controller,
//! which leaves retrying to the user.

pub mod storefront;

// Re-export main client types
pub use storefront::StorefrontClient;
