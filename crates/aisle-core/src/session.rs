//! Search session: runs a [`SearchController`] on a single tokio task.
//!
//! # Architecture
//!
//! The session is an actor. One task owns the controller, the debounce slot
//! and every in-flight fetch, so state mutation and the staleness check always
//! happen on one logical thread and no locks are needed:
//!
//! ```text
//! loop {
//!     select {
//!         cancelled          => stop
//!         intent from handle => controller.handle(intent)  -> execute transition
//!         fetch finished     => controller.apply(response) -> publish
//!         debounce fired     => controller.debounce_elapsed(ticket) -> execute
//!     }
//! }
//! ```
//!
//! Fetches run as tasks in a [`JoinSet`]; nothing aborts them while the
//! session lives, their responses are simply ignored once stale. A fetch task
//! that panics is answered on behalf of its token with a failed response, so
//! the controller leaves its loading state the same way it would for an HTTP
//! error. Closing the session (or dropping every [`SearchHandle`]) ends the
//! loop and aborts what is still in flight.
//!
//! # Example
//!
//! ```ignore
//! use aisle_core::{InitialSearch, SearchConfig, SearchSession, TracingReporter};
//!
//! let handle = SearchSession::spawn(client, SearchConfig::default(), InitialSearch::default(), TracingReporter);
//! handle.on_query_text_changed("serum")?;
//! let state = handle.wait_for(|s| s.epoch.value() > 0 && !s.status.is_loading()).await?;
//! println!("{} products", state.items.len());
//! handle.close();
//! ```

use std::collections::HashMap;

use tokio::sync::{mpsc, watch};
use tokio::task::{self, JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::config::SearchConfig;
use crate::controller::{
    ApplyOutcome, DebounceCommand, DebounceTicket, FetchRequest, FetchResponse, InitialSearch,
    Intent, RequestToken, SearchController, Transition,
};
use crate::debounce::DebounceSlot;
use crate::error::AppError;
use crate::query::{FilterSet, SortKey};
use crate::reporter::{SearchEvent, SearchReporter};
use crate::state::SearchState;
use crate::traits::ProductSearchApi;

// =============================================================================
// Search Handle
// =============================================================================

/// Renderer-side handle to a running session.
///
/// Input methods are synchronous so they can be called straight from UI
/// callbacks; they only enqueue the intent. Cloning the handle is cheap.
#[derive(Clone)]
pub struct SearchHandle {
    intents: mpsc::UnboundedSender<Intent>,
    state: watch::Receiver<SearchState>,
    cancel: CancellationToken,
}

impl SearchHandle {
    /// Forwards a text edit from the query input.
    pub fn on_query_text_changed(&self, text: impl Into<String>) -> Result<(), AppError> {
        self.send(Intent::QueryChanged(text.into()))
    }

    /// Forwards a filter sheet selection.
    pub fn on_filter_sheet_applied(&self, filters: FilterSet) -> Result<(), AppError> {
        self.send(Intent::FiltersApplied(filters))
    }

    /// Forwards a sort picker selection.
    pub fn on_sort_selected(&self, sort: SortKey) -> Result<(), AppError> {
        self.send(Intent::SortSelected(sort))
    }

    /// Forwards a "scrolled near the bottom" event.
    pub fn on_scrolled_near_bottom(&self) -> Result<(), AppError> {
        self.send(Intent::ScrolledNearBottom)
    }

    /// Forwards a pull-to-refresh gesture.
    pub fn on_pull_to_refresh(&self) -> Result<(), AppError> {
        self.send(Intent::PullToRefresh)
    }

    /// Forwards a tap on the retry affordance.
    pub fn retry(&self) -> Result<(), AppError> {
        self.send(Intent::Retry)
    }

    /// Latest published state.
    pub fn snapshot(&self) -> SearchState {
        self.state.borrow().clone()
    }

    /// A receiver that is notified after every state change.
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.clone()
    }

    /// Waits until the published state satisfies `predicate`.
    ///
    /// Checks the current state first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::SessionClosed` if the session ends first.
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&SearchState) -> bool,
    ) -> Result<SearchState, AppError> {
        let mut rx = self.state.clone();
        let state = rx
            .wait_for(predicate)
            .await
            .map_err(|_| AppError::SessionClosed)?;
        Ok(state.clone())
    }

    /// Stops the session. Further input returns `AppError::SessionClosed`.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.intents.is_closed()
    }

    fn send(&self, intent: Intent) -> Result<(), AppError> {
        if self.cancel.is_cancelled() {
            return Err(AppError::SessionClosed);
        }
        self.intents
            .send(intent)
            .map_err(|_| AppError::SessionClosed)
    }
}

// =============================================================================
// Search Session
// =============================================================================

/// The actor that owns a search screen's controller.
pub struct SearchSession<A, R>
where
    A: ProductSearchApi,
    R: SearchReporter,
{
    api: A,
    reporter: R,
    controller: SearchController,
    debounce: DebounceSlot<DebounceTicket>,
    in_flight: JoinSet<FetchResponse>,
    /// Token of every fetch still in `in_flight`, keyed by task id.
    tokens: HashMap<task::Id, RequestToken>,
    intents: mpsc::UnboundedReceiver<Intent>,
    state_tx: watch::Sender<SearchState>,
    cancel: CancellationToken,
}

impl<A, R> SearchSession<A, R>
where
    A: ProductSearchApi,
    R: SearchReporter + 'static,
{
    /// Creates a session without starting it.
    ///
    /// Use [`SearchSession::spawn`] unless the caller wants to drive
    /// [`SearchSession::run`] itself.
    pub fn new(
        api: A,
        config: SearchConfig,
        initial: InitialSearch,
        reporter: R,
    ) -> (SearchHandle, Self) {
        let controller = SearchController::new(config, initial);
        let (intents_tx, intents_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(controller.snapshot());
        let cancel = CancellationToken::new();

        let handle = SearchHandle {
            intents: intents_tx,
            state: state_rx,
            cancel: cancel.clone(),
        };
        let session = Self {
            api,
            reporter,
            controller,
            debounce: DebounceSlot::new(),
            in_flight: JoinSet::new(),
            tokens: HashMap::new(),
            intents: intents_rx,
            state_tx,
            cancel,
        };
        (handle, session)
    }

    /// Mounts a search screen: spawns the session on the current runtime.
    ///
    /// A non-blank initial query is fetched immediately, without debounce.
    pub fn spawn(api: A, config: SearchConfig, initial: InitialSearch, reporter: R) -> SearchHandle {
        let (handle, session) = Self::new(api, config, initial, reporter);
        tokio::spawn(session.run());
        handle
    }

    /// Runs the event loop until the session is closed or every handle is
    /// dropped.
    pub async fn run(mut self) {
        let start = self.controller.start();
        self.execute(start);
        self.publish();

        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break,

                intent = self.intents.recv() => match intent {
                    Some(intent) => self.dispatch(intent),
                    None => break,
                },

                Some(joined) = self.in_flight.join_next_with_id() => self.complete(joined),

                ticket = self.debounce.fired(), if self.debounce.is_pending() => {
                    self.dispatch(Intent::DebounceElapsed(ticket))
                }
            }
        }

        self.in_flight.abort_all();
        self.tokens.clear();
        self.reporter.report(SearchEvent::Closed);
    }

    fn dispatch(&mut self, intent: Intent) {
        let cleared = matches!(&intent, Intent::QueryChanged(text) if text.trim().is_empty());
        let transition = self.controller.handle(intent);
        if cleared {
            self.reporter.report(SearchEvent::QueryCleared {
                epoch: self.controller.state().epoch,
            });
        }
        self.execute(transition);
        self.publish();
    }

    fn execute(&mut self, transition: Transition) {
        match transition.debounce {
            DebounceCommand::Keep => {}
            DebounceCommand::Schedule { ticket, delay } => {
                self.debounce.schedule(ticket, delay);
                self.reporter.report(SearchEvent::DebounceScheduled {
                    query: &self.controller.state().query,
                });
            }
            DebounceCommand::Cancel => {
                self.debounce.cancel();
            }
        }

        if let Some(request) = transition.fetch {
            self.reporter.report(SearchEvent::RequestIssued {
                epoch: request.token.epoch(),
                page: request.token.page(),
                kind: request.token.kind(),
                query: &request.query.query,
            });

            let api = self.api.clone();
            let FetchRequest { token, query } = request;
            let task = self.in_flight.spawn(async move {
                let result = api.search(&query).await;
                FetchResponse { token, result }
            });
            self.tokens.insert(task.id(), token);
        }
    }

    fn complete(&mut self, joined: Result<(task::Id, FetchResponse), JoinError>) {
        let response = match joined {
            Ok((id, response)) => {
                self.tokens.remove(&id);
                response
            }
            Err(e) => {
                self.reporter.report(SearchEvent::FetchAborted {
                    error: &e.to_string(),
                });
                let Some(token) = self.tokens.remove(&e.id()) else {
                    return;
                };
                if e.is_cancelled() {
                    return;
                }
                FetchResponse {
                    token,
                    result: Err(AppError::Generic(
                        "search request failed unexpectedly".to_string(),
                    )),
                }
            }
        };

        let token = response.token;
        match self.controller.apply(response) {
            ApplyOutcome::Applied { count, has_more } => {
                self.reporter.report(SearchEvent::PageApplied {
                    epoch: token.epoch(),
                    page: token.page(),
                    count,
                    has_more,
                });
            }
            ApplyOutcome::Failed(error) => {
                self.reporter.report(SearchEvent::RequestFailed {
                    epoch: token.epoch(),
                    page: token.page(),
                    error: &error,
                });
            }
            ApplyOutcome::Stale { current } => {
                self.reporter.report(SearchEvent::StaleDiscarded {
                    epoch: token.epoch(),
                    current,
                    page: token.page(),
                });
            }
        }
        self.publish();
    }

    fn publish(&self) {
        let state = self.controller.state();
        self.state_tx.send_if_modified(|current| {
            if current == state {
                false
            } else {
                *current = state.clone();
                true
            }
        });
    }
}
