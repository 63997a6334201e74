//! Aisle Core - Search state, request sequencing and pagination.
//!
//! This crate provides the storefront search logic shared by every Aisle
//! frontend:
//!
//! - **Domain models**: [`Product`], [`ProductPage`], [`ProductQuery`]
//! - **Controller**: [`SearchController`], a synchronous state machine that
//!   turns user intents into fetch requests and applies responses
//! - **Session**: [`SearchSession`] runs a controller on a tokio task with a
//!   real debounce timer; [`SearchHandle`] is what a renderer holds
//! - **Traits**: [`ProductSearchApi`] for dependency injection
//! - **Event reporting**: [`SearchReporter`] trait for decoupled logging
//!
//! # Architecture
//!
//! The controller never performs I/O and never reads the clock. It returns a
//! [`Transition`] describing the debounce and fetch side effects, and every
//! request it issues carries a [`RequestToken`]. Only the response for the
//! latest token is applied, so slow responses from superseded queries can
//! never overwrite newer results.
//!
//! - [`ProductSearchApi`] - abstracts the product collection endpoint (e.g. HTTP)
//! - [`SearchReporter`] - abstracts logging of session events
//!
//! # Example
//!
//! ```ignore
//! use aisle_core::{InitialSearch, SearchConfig, SearchSession, TracingReporter};
//!
//! let handle = SearchSession::spawn(client, SearchConfig::from_env(), InitialSearch::default(), TracingReporter);
//! handle.on_query_text_changed("vitamin c serum")?;
//! let state = handle.wait_for(|s| s.page > 1 && !s.status.is_loading()).await?;
//! for product in &state.items {
//!     println!("{} {}", product.name, product.display_price());
//! }
//! ```

pub mod config;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod models;
pub mod query;
pub mod reporter;
pub mod session;
pub mod state;
pub mod traits;

// Configuration
pub use config::{
    DEFAULT_DEBOUNCE, DEFAULT_PER_PAGE, HttpConfig, MAX_PER_PAGE, SearchConfig, StorefrontConfig,
    default_config_path, load_storefront_config,
};

// Error handling
pub use error::AppError;

// Domain models
pub use models::{Attribute, Category, CategoryList, FaceAttributes, Facets, Product, ProductPage};
pub use query::{FilterSet, ProductQuery, SortKey};

// Search state
pub use state::{Epoch, SearchError, SearchState, SearchStatus};

// Controller
pub use controller::{
    ApplyOutcome, DebounceCommand, DebounceTicket, FetchKind, FetchRequest, FetchResponse,
    InitialSearch, Intent, RequestToken, SearchController, Transition,
};
pub use debounce::DebounceSlot;

// Session
pub use session::{SearchHandle, SearchSession};

// Event reporting
pub use reporter::{SearchEvent, SearchReporter, SilentReporter, TracingReporter};

// Traits for dependency injection
pub use traits::ProductSearchApi;
