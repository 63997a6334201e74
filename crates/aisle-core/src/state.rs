//! The search screen state and its snapshot type.

use std::fmt;

use crate::error::AppError;
use crate::models::Product;
use crate::query::{FilterSet, SortKey};

/// Tag of one reset-and-fetch cycle.
///
/// Only the controller advances it. A response is applied only if the epoch
/// captured when its request was issued is still the current one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Epoch(u64);

impl Epoch {
    pub(crate) fn next(self) -> Self {
        Epoch(self.0 + 1)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the results area is doing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchStatus {
    #[default]
    Idle,
    /// First page of a new query/filter/sort is loading (full-screen loader).
    InitialLoading,
    /// A continuation page is loading (footer spinner).
    LoadingMore,
    /// Pull-to-refresh reload of the first page.
    Refreshing,
    /// The last authoritative request failed; see [`SearchState::error`].
    Error,
}

impl SearchStatus {
    /// Returns true while a request is outstanding.
    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            SearchStatus::InitialLoading | SearchStatus::LoadingMore | SearchStatus::Refreshing
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchStatus::Idle => "idle",
            SearchStatus::InitialLoading => "initial_loading",
            SearchStatus::LoadingMore => "loading_more",
            SearchStatus::Refreshing => "refreshing",
            SearchStatus::Error => "error",
        }
    }
}

impl fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-facing description of a failed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchError {
    pub message: String,
    /// Page that failed; `1` means the first load, anything higher a
    /// load-more continuation.
    pub page: u32,
    /// Whether offering a retry makes sense.
    pub retryable: bool,
}

impl SearchError {
    pub(crate) fn from_app_error(error: &AppError, page: u32) -> Self {
        Self {
            message: error.user_message(),
            page,
            retryable: error.is_retryable(),
        }
    }

    /// Returns true if the failure happened while loading more results.
    pub fn is_continuation(&self) -> bool {
        self.page > 1
    }
}

/// Everything a renderer needs to draw the search screen.
///
/// Renderers only ever see clones of this record; the controller owns the
/// authoritative copy.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    pub query: String,
    pub filters: FilterSet,
    pub sort: SortKey,
    /// Next page to request.
    pub page: u32,
    /// Concatenation of every page loaded under the current epoch.
    pub items: Vec<Product>,
    pub has_more: bool,
    pub status: SearchStatus,
    pub error: Option<SearchError>,
    pub epoch: Epoch,
}

impl SearchState {
    pub(crate) fn new(query: String, filters: FilterSet, sort: SortKey) -> Self {
        Self {
            query,
            filters,
            sort,
            page: 1,
            items: Vec::new(),
            has_more: true,
            status: SearchStatus::Idle,
            error: None,
            epoch: Epoch::default(),
        }
    }

    /// Returns true if the query text is blank, which disables fetching.
    pub fn query_is_blank(&self) -> bool {
        self.query.trim().is_empty()
    }

    /// Returns true if the renderer should show a full-screen retry affordance.
    pub fn shows_retry(&self) -> bool {
        self.status == SearchStatus::Error && self.items.is_empty()
    }
}
