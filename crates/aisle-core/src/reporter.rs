//! Search event reporting.
//!
//! The session emits a [`SearchEvent`] for every decision worth observing.
//! Reporters decide what to do with them, keeping the controller free of
//! logging concerns.
//!
//! - [`SilentReporter`] ignores everything (library default, tests).
//! - [`TracingReporter`] writes structured `tracing` events.

use tracing::{debug, info, warn};

use crate::controller::FetchKind;
use crate::state::{Epoch, SearchError};

// =============================================================================
// Search Events
// =============================================================================

/// Events emitted by a search session.
#[derive(Debug, Clone)]
pub enum SearchEvent<'a> {
    /// Query text changed and the debounce was (re)started.
    DebounceScheduled { query: &'a str },
    /// Query text became blank; results were cleared without a request.
    QueryCleared { epoch: Epoch },
    /// A request was sent to the product search API.
    RequestIssued {
        epoch: Epoch,
        page: u32,
        kind: FetchKind,
        query: &'a str,
    },
    /// A page was appended to the results.
    PageApplied {
        epoch: Epoch,
        page: u32,
        count: usize,
        has_more: bool,
    },
    /// A response arrived for a superseded request and was dropped.
    StaleDiscarded { epoch: Epoch, current: Epoch, page: u32 },
    /// The authoritative request failed.
    RequestFailed {
        epoch: Epoch,
        page: u32,
        error: &'a SearchError,
    },
    /// A fetch task ended without producing a response.
    FetchAborted { error: &'a str },
    /// The session stopped processing input.
    Closed,
}

// =============================================================================
// Reporter Trait
// =============================================================================

/// Trait for reporting search session events.
pub trait SearchReporter: Send + Sync {
    /// Called when a search event occurs.
    ///
    /// The default implementation does nothing (silent mode).
    fn report(&self, event: SearchEvent<'_>) {
        let _ = event;
    }
}

/// Silent reporter that ignores all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl SearchReporter for SilentReporter {}

/// Tracing-based reporter for CLI/app logging.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl SearchReporter for TracingReporter {
    fn report(&self, event: SearchEvent<'_>) {
        match event {
            SearchEvent::DebounceScheduled { query } => {
                // Once per keystroke
                debug!(query, "Debounce scheduled");
            }
            SearchEvent::QueryCleared { epoch } => {
                debug!(%epoch, "Query cleared");
            }
            SearchEvent::RequestIssued {
                epoch,
                page,
                kind,
                query,
            } => {
                info!(%epoch, page, ?kind, query, "Fetching products");
            }
            SearchEvent::PageApplied {
                epoch,
                page,
                count,
                has_more,
            } => {
                info!(%epoch, page, count, has_more, "Page loaded");
            }
            SearchEvent::StaleDiscarded {
                epoch,
                current,
                page,
            } => {
                debug!(%epoch, %current, page, "Discarded stale response");
            }
            SearchEvent::RequestFailed { epoch, page, error } => {
                warn!(%epoch, page, retryable = error.retryable, error = %error.message, "Product fetch failed");
            }
            SearchEvent::FetchAborted { error } => {
                warn!(%error, "Fetch task ended without a response");
            }
            SearchEvent::Closed => {
                debug!("Search session closed");
            }
        }
    }
}
