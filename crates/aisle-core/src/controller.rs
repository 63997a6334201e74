//! Search controller: the pure state machine behind the search screen.
//!
//! [`SearchController`] owns a [`SearchState`] and turns user intents into
//! state transitions plus side effects to perform. It does no I/O and keeps
//! no timers; the caller (usually [`SearchSession`](crate::session::SearchSession))
//! executes the returned [`Transition`] and feeds results back through
//! [`SearchController::apply`].
//!
//! # State machine
//!
//! ```text
//! idle --(debounce fires | filters | sort | refresh)--> initial_loading / refreshing
//! initial_loading / refreshing --(success)--> idle
//! initial_loading / refreshing --(failure)--> error
//! idle --(load_more, has_more)--> loading_more
//! loading_more --(success)--> idle
//! loading_more --(failure)--> error (has_more = false)
//! error --(query | filters | sort | refresh)--> initial_loading / refreshing
//! error --(retry)--> initial_loading | loading_more
//! ```
//!
//! # Staleness
//!
//! Every fetch carries a [`RequestToken`] minted here. A response is applied
//! only when its token names the current epoch and is the one request the
//! controller is waiting for; anything else is dropped without touching state,
//! whether it succeeded or failed. Each reset advances the epoch, so a slow
//! response to an old query can never overwrite a newer one.

use std::time::Duration;

use crate::config::SearchConfig;
use crate::error::AppError;
use crate::models::ProductPage;
use crate::query::{FilterSet, ProductQuery, SortKey};
use crate::state::{Epoch, SearchError, SearchState, SearchStatus};

/// Initial screen parameters supplied by the caller on mount.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitialSearch {
    pub query: String,
    pub filters: FilterSet,
    pub sort: SortKey,
}

impl InitialSearch {
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_filters(mut self, filters: FilterSet) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_sort(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }
}

/// Why a fetch was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// First page after a query, filter or sort change.
    Initial,
    /// First page after pull-to-refresh.
    Refresh,
    /// Continuation page.
    LoadMore,
}

/// Proof that a request was issued by the controller.
///
/// Tokens can only be created by [`SearchController`]; a response can only be
/// applied by handing its token back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    epoch: Epoch,
    page: u32,
    kind: FetchKind,
    serial: u64,
}

impl RequestToken {
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn kind(&self) -> FetchKind {
        self.kind
    }
}

/// Identifies one scheduled debounce expiry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebounceTicket(u64);

/// A request the caller must send to the product search API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub token: RequestToken,
    pub query: ProductQuery,
}

/// The outcome of a request, handed back to [`SearchController::apply`].
#[derive(Debug)]
pub struct FetchResponse {
    pub token: RequestToken,
    pub result: Result<ProductPage, AppError>,
}

/// What to do with the single debounce slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DebounceCommand {
    /// Leave the slot as it is.
    #[default]
    Keep,
    /// Replace whatever is pending with a new expiry.
    Schedule {
        ticket: DebounceTicket,
        delay: Duration,
    },
    /// Drop whatever is pending.
    Cancel,
}

/// Side effects produced by one transition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    pub debounce: DebounceCommand,
    pub fetch: Option<FetchRequest>,
}

impl Transition {
    fn none() -> Self {
        Self::default()
    }

    /// Returns true if the transition asks for nothing.
    pub fn is_noop(&self) -> bool {
        self.debounce == DebounceCommand::Keep && self.fetch.is_none()
    }
}

/// Result of applying a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// A page was appended.
    Applied { count: usize, has_more: bool },
    /// The request failed and the state moved to `error`.
    Failed(SearchError),
    /// The response belonged to a superseded request and was ignored.
    Stale { current: Epoch },
}

/// A user intent, as forwarded by the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    QueryChanged(String),
    DebounceElapsed(DebounceTicket),
    FiltersApplied(FilterSet),
    SortSelected(SortKey),
    ScrolledNearBottom,
    PullToRefresh,
    Retry,
}

/// Reducer for the search screen.
#[derive(Debug, Clone)]
pub struct SearchController {
    state: SearchState,
    config: SearchConfig,
    debounce_ticket: DebounceTicket,
    debounce_armed: bool,
    request_serial: u64,
    awaiting: Option<RequestToken>,
}

impl SearchController {
    /// Creates a controller for a freshly mounted screen.
    ///
    /// No request is issued; callers that want results for a non-blank
    /// initial query call [`SearchController::refresh`] or
    /// [`SearchController::start`].
    pub fn new(config: SearchConfig, initial: InitialSearch) -> Self {
        Self {
            state: SearchState::new(initial.query, initial.filters, initial.sort),
            config,
            debounce_ticket: DebounceTicket::default(),
            debounce_armed: false,
            request_serial: 0,
            awaiting: None,
        }
    }

    /// Issues the first fetch for the initial parameters, if the query is not
    /// blank.
    pub fn start(&mut self) -> Transition {
        self.reset_and_fetch(FetchKind::Initial)
    }

    /// Current state.
    pub fn state(&self) -> &SearchState {
        &self.state
    }

    /// Owned copy of the current state for a renderer.
    pub fn snapshot(&self) -> SearchState {
        self.state.clone()
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Returns true while a query debounce is waiting to fire.
    pub fn debounce_pending(&self) -> bool {
        self.debounce_armed
    }

    /// Dispatches an intent to the matching operation.
    pub fn handle(&mut self, intent: Intent) -> Transition {
        match intent {
            Intent::QueryChanged(text) => self.set_query(text),
            Intent::DebounceElapsed(ticket) => self.debounce_elapsed(ticket),
            Intent::FiltersApplied(filters) => self.set_filters(filters),
            Intent::SortSelected(sort) => self.set_sort(sort),
            Intent::ScrolledNearBottom => self.load_more(),
            Intent::PullToRefresh => self.refresh(),
            Intent::Retry => self.retry(),
        }
    }

    /// Echoes new query text and (re)starts the debounce.
    ///
    /// Blank text clears the results synchronously and issues nothing. The
    /// epoch still advances so an in-flight response for the previous text
    /// cannot repopulate the cleared list.
    pub fn set_query(&mut self, text: impl Into<String>) -> Transition {
        self.state.query = text.into();

        if self.state.query_is_blank() {
            self.debounce_armed = false;
            self.awaiting = None;
            self.state.epoch = self.state.epoch.next();
            self.state.items.clear();
            self.state.page = 1;
            self.state.has_more = true;
            self.state.status = SearchStatus::Idle;
            self.state.error = None;
            return Transition {
                debounce: DebounceCommand::Cancel,
                fetch: None,
            };
        }

        self.debounce_ticket = DebounceTicket(self.debounce_ticket.0 + 1);
        self.debounce_armed = true;
        Transition {
            debounce: DebounceCommand::Schedule {
                ticket: self.debounce_ticket,
                delay: self.config.debounce,
            },
            fetch: None,
        }
    }

    /// Handles a debounce expiry. Only the most recently scheduled ticket
    /// triggers a fetch.
    pub fn debounce_elapsed(&mut self, ticket: DebounceTicket) -> Transition {
        if !self.debounce_armed || ticket != self.debounce_ticket {
            return Transition::none();
        }
        self.debounce_armed = false;
        self.reset_and_fetch(FetchKind::Initial)
    }

    /// Replaces the filter selection and re-fetches immediately.
    pub fn set_filters(&mut self, filters: FilterSet) -> Transition {
        self.state.filters = filters;
        self.disarm_and_reset(FetchKind::Initial)
    }

    /// Replaces the sort key and re-fetches immediately.
    pub fn set_sort(&mut self, sort: SortKey) -> Transition {
        self.state.sort = sort;
        self.disarm_and_reset(FetchKind::Initial)
    }

    /// Pull-to-refresh: reset and re-fetch with the `refreshing` status.
    pub fn refresh(&mut self) -> Transition {
        self.disarm_and_reset(FetchKind::Refresh)
    }

    /// Requests the next page when the renderer nears the end of the list.
    ///
    /// No-op while any request is outstanding, when no more pages are
    /// expected, or when the query is blank.
    pub fn load_more(&mut self) -> Transition {
        if self.state.status.is_loading() || !self.state.has_more || self.state.query_is_blank() {
            return Transition::none();
        }
        self.state.status = SearchStatus::LoadingMore;
        self.state.error = None;
        Transition {
            debounce: DebounceCommand::Keep,
            fetch: Some(self.issue(FetchKind::LoadMore)),
        }
    }

    /// User-initiated retry after a failure.
    ///
    /// A failed first page is retried as a full reset; a failed continuation
    /// re-requests the same page and keeps the items already shown.
    pub fn retry(&mut self) -> Transition {
        if self.state.status != SearchStatus::Error {
            return Transition::none();
        }
        let continuation = self
            .state
            .error
            .as_ref()
            .is_some_and(SearchError::is_continuation);
        if !continuation || self.state.query_is_blank() {
            return self.reset_and_fetch(FetchKind::Initial);
        }

        self.state.has_more = true;
        self.state.status = SearchStatus::LoadingMore;
        self.state.error = None;
        Transition {
            debounce: DebounceCommand::Keep,
            fetch: Some(self.issue(FetchKind::LoadMore)),
        }
    }

    /// Applies the response to a previously issued request.
    pub fn apply(&mut self, response: FetchResponse) -> ApplyOutcome {
        let FetchResponse { token, result } = response;

        if !self.is_current(&token) {
            return ApplyOutcome::Stale {
                current: self.state.epoch,
            };
        }
        self.awaiting = None;

        match result {
            Ok(page) => {
                let count = page.items.len();
                self.state.items.extend(page.items);
                self.state.has_more = count == self.config.per_page as usize;
                self.state.page += 1;
                self.state.status = SearchStatus::Idle;
                self.state.error = None;
                ApplyOutcome::Applied {
                    count,
                    has_more: self.state.has_more,
                }
            }
            Err(e) => {
                let error = SearchError::from_app_error(&e, token.page);
                self.state.status = SearchStatus::Error;
                self.state.has_more = false;
                self.state.error = Some(error.clone());
                ApplyOutcome::Failed(error)
            }
        }
    }

    /// Returns true if a response carrying `token` would be applied.
    ///
    /// Only the single outstanding request of the current epoch qualifies.
    pub fn is_current(&self, token: &RequestToken) -> bool {
        token.epoch == self.state.epoch && self.awaiting.as_ref() == Some(token)
    }

    fn disarm_and_reset(&mut self, kind: FetchKind) -> Transition {
        self.debounce_armed = false;
        let mut transition = self.reset_and_fetch(kind);
        transition.debounce = DebounceCommand::Cancel;
        transition
    }

    fn reset_and_fetch(&mut self, kind: FetchKind) -> Transition {
        self.state.epoch = self.state.epoch.next();
        self.state.items.clear();
        self.state.page = 1;
        self.state.has_more = true;
        self.state.error = None;
        self.awaiting = None;

        if self.state.query_is_blank() {
            self.state.status = SearchStatus::Idle;
            return Transition::none();
        }

        self.state.status = match kind {
            FetchKind::Refresh => SearchStatus::Refreshing,
            _ => SearchStatus::InitialLoading,
        };
        Transition {
            debounce: DebounceCommand::Keep,
            fetch: Some(self.issue(kind)),
        }
    }

    fn issue(&mut self, kind: FetchKind) -> FetchRequest {
        self.request_serial += 1;
        let token = RequestToken {
            epoch: self.state.epoch,
            page: self.state.page,
            kind,
            serial: self.request_serial,
        };
        self.awaiting = Some(token);
        FetchRequest {
            token,
            query: ProductQuery {
                query: self.state.query.trim().to_string(),
                filters: self.state.filters.clone(),
                sort: self.state.sort,
                page: self.state.page,
                per_page: self.config.per_page,
            },
        }
    }
}
