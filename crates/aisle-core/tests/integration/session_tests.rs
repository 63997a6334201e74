//! Integration tests for `SearchSession`: debounce, stale responses,
//! pagination and failure handling end to end.

use std::time::Duration;

use aisle_core::{
    AppError, FilterSet, InitialSearch, SearchConfig, SearchHandle, SearchSession, SearchState,
    SearchStatus, SilentReporter, SortKey,
};
use tokio::time::{advance, sleep, timeout};

use crate::integration::common::{MockSearchApi, WAIT, products};

fn spawn(api: &MockSearchApi) -> SearchHandle {
    SearchSession::spawn(
        api.clone(),
        SearchConfig::default(),
        InitialSearch::default(),
        SilentReporter,
    )
}

async fn wait_state(
    handle: &SearchHandle,
    predicate: impl FnMut(&SearchState) -> bool,
) -> SearchState {
    timeout(WAIT, handle.wait_for(predicate))
        .await
        .expect("state should reach the expected shape")
        .unwrap()
}

/// Types `text`, waits out the debounce and answers the first page.
async fn search_with_first_page(api: &MockSearchApi, handle: &SearchHandle, text: &str, count: usize) {
    handle.on_query_text_changed(text).unwrap();
    let call = api.next_call().await;
    assert_eq!(call.query.page, 1);
    call.respond_items(products(text, 0, count));
    wait_state(handle, |s| s.page == 2 && s.status == SearchStatus::Idle).await;
}

// =============================================================================
// Debounce
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_keystroke_burst_sends_one_request_with_final_text() {
    let api = MockSearchApi::new();
    let handle = spawn(&api);

    for text in ["s", "so", "soa", "soap"] {
        handle.on_query_text_changed(text).unwrap();
        advance(Duration::from_millis(100)).await;
    }
    assert_eq!(api.call_count(), 0, "nothing is sent before the quiet period");

    let call = api.next_call().await;
    assert_eq!(call.param("q").as_deref(), Some("soap"));
    assert_eq!(call.param("page").as_deref(), Some("1"));
    assert_eq!(call.param("per_page").as_deref(), Some("20"));
    assert_eq!(call.param("sort"), None);

    sleep(Duration::from_secs(5)).await;
    assert_eq!(api.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_echoes_query_before_debounce() {
    let api = MockSearchApi::new();
    let handle = spawn(&api);

    handle.on_query_text_changed("ser").unwrap();
    let state = wait_state(&handle, |s| s.query == "ser").await;
    assert_eq!(state.status, SearchStatus::Idle);
    assert_eq!(api.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_clearing_query_sends_nothing() {
    let api = MockSearchApi::new();
    let handle = spawn(&api);

    handle.on_query_text_changed("soap").unwrap();
    advance(Duration::from_millis(100)).await;
    handle.on_query_text_changed("   ").unwrap();

    sleep(Duration::from_secs(5)).await;
    assert_eq!(api.call_count(), 0);

    let state = handle.snapshot();
    assert!(state.items.is_empty());
    assert_eq!(state.status, SearchStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_clearing_query_discards_in_flight_response() {
    let api = MockSearchApi::new();
    let handle = spawn(&api);

    handle.on_query_text_changed("soap").unwrap();
    let call = api.next_call().await;
    wait_state(&handle, |s| s.status == SearchStatus::InitialLoading).await;

    handle.on_query_text_changed("").unwrap();
    wait_state(&handle, |s| s.status == SearchStatus::Idle).await;

    call.respond_items(products("soap", 0, 20));
    sleep(Duration::from_secs(1)).await;
    assert!(handle.snapshot().items.is_empty());
}

// =============================================================================
// Stale responses
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_late_response_for_old_query_is_discarded() {
    let api = MockSearchApi::new();
    let handle = spawn(&api);

    handle.on_query_text_changed("soap").unwrap();
    let soap = api.next_call().await;

    handle.on_query_text_changed("serum").unwrap();
    let serum = api.next_call().await;
    assert_eq!(serum.param("q").as_deref(), Some("serum"));

    serum.respond_items(products("serum", 0, 20));
    let state = wait_state(&handle, |s| s.items.len() == 20).await;
    assert!(state.items.iter().all(|p| p.name.starts_with("serum")));

    soap.respond_items(products("soap", 0, 5));
    sleep(Duration::from_secs(1)).await;

    let state = handle.snapshot();
    assert_eq!(state.items.len(), 20);
    assert!(state.items.iter().all(|p| p.name.starts_with("serum")));
    assert_eq!(state.query, "serum");
}

#[tokio::test(start_paused = true)]
async fn test_old_response_arriving_first_does_not_finish_loading() {
    let api = MockSearchApi::new();
    let handle = spawn(&api);

    handle.on_query_text_changed("soap").unwrap();
    let soap = api.next_call().await;
    handle.on_query_text_changed("serum").unwrap();
    let serum = api.next_call().await;

    soap.respond(Err(AppError::NetworkError("reset".to_string())));
    sleep(Duration::from_secs(1)).await;
    let state = handle.snapshot();
    assert_eq!(state.status, SearchStatus::InitialLoading);
    assert!(state.error.is_none());

    serum.respond_items(products("serum", 0, 3));
    let state = wait_state(&handle, |s| s.status == SearchStatus::Idle).await;
    assert_eq!(state.items.len(), 3);
    assert!(!state.has_more);
}

// =============================================================================
// Pagination
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_full_page_then_short_page() {
    let api = MockSearchApi::new();
    let handle = spawn(&api);
    search_with_first_page(&api, &handle, "soap", 20).await;
    assert!(handle.snapshot().has_more);

    handle.on_scrolled_near_bottom().unwrap();
    let call = api.next_call().await;
    assert_eq!(call.param("page").as_deref(), Some("2"));
    assert_eq!(call.param("q").as_deref(), Some("soap"));
    call.respond_items(products("soap", 20, 7));

    let state = wait_state(&handle, |s| s.items.len() == 27).await;
    assert!(!state.has_more);
    assert_eq!(state.page, 3);
    assert_eq!(state.items[20].id, "soap-20");

    handle.on_scrolled_near_bottom().unwrap();
    sleep(Duration::from_secs(1)).await;
    assert_eq!(api.call_count(), 2, "no request once the list is exhausted");
}

#[tokio::test(start_paused = true)]
async fn test_repeated_scroll_events_request_one_page() {
    let api = MockSearchApi::new();
    let handle = spawn(&api);
    search_with_first_page(&api, &handle, "soap", 20).await;

    for _ in 0..5 {
        handle.on_scrolled_near_bottom().unwrap();
    }
    let call = api.next_call().await;
    sleep(Duration::from_secs(1)).await;
    assert_eq!(api.call_count(), 2);
    assert_eq!(handle.snapshot().status, SearchStatus::LoadingMore);

    call.respond_items(products("soap", 20, 20));
    let state = wait_state(&handle, |s| s.items.len() == 40).await;
    assert!(state.has_more);
}

#[tokio::test(start_paused = true)]
async fn test_typing_while_loading_more_restarts_at_page_one() {
    let api = MockSearchApi::new();
    let handle = spawn(&api);
    search_with_first_page(&api, &handle, "soap", 20).await;

    handle.on_scrolled_near_bottom().unwrap();
    let more = api.next_call().await;

    handle.on_query_text_changed("serum").unwrap();
    let serum = api.next_call().await;
    assert_eq!(serum.param("page").as_deref(), Some("1"));

    more.respond_items(products("soap", 20, 20));
    serum.respond_items(products("serum", 0, 4));

    let state = wait_state(&handle, |s| s.status == SearchStatus::Idle && s.query == "serum" && !s.items.is_empty()).await;
    assert_eq!(state.items.len(), 4);
}

// =============================================================================
// Filters, sort, refresh
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_filters_are_sent_and_cleared() {
    let api = MockSearchApi::new();
    let handle = spawn(&api);
    search_with_first_page(&api, &handle, "soap", 20).await;

    handle
        .on_filter_sheet_applied(FilterSet::new().with_category("skincare"))
        .unwrap();
    let call = api.next_call().await;
    assert_eq!(call.param("category").as_deref(), Some("skincare"));
    assert_eq!(call.param("page").as_deref(), Some("1"));
    call.respond_items(products("soap", 0, 2));
    wait_state(&handle, |s| s.items.len() == 2).await;

    handle.on_filter_sheet_applied(FilterSet::new()).unwrap();
    let call = api.next_call().await;
    assert_eq!(call.param("category"), None);
    assert_eq!(call.param("q").as_deref(), Some("soap"));
}

#[tokio::test(start_paused = true)]
async fn test_sort_change_refetches_immediately() {
    let api = MockSearchApi::new();
    let handle = spawn(&api);
    search_with_first_page(&api, &handle, "serum", 20).await;

    handle.on_sort_selected(SortKey::PriceAsc).unwrap();
    let state = wait_state(&handle, |s| s.status == SearchStatus::InitialLoading).await;
    assert!(state.items.is_empty());

    let call = api.next_call().await;
    assert_eq!(call.param("sort").as_deref(), Some("price"));
    assert_eq!(api.history().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_pull_to_refresh() {
    let api = MockSearchApi::new();
    let handle = spawn(&api);
    search_with_first_page(&api, &handle, "toner", 20).await;

    handle.on_pull_to_refresh().unwrap();
    wait_state(&handle, |s| s.status == SearchStatus::Refreshing).await;

    let call = api.next_call().await;
    assert_eq!(call.param("page").as_deref(), Some("1"));
    call.respond_items(products("toner", 0, 6));

    let state = wait_state(&handle, |s| s.status == SearchStatus::Idle).await;
    assert_eq!(state.items.len(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_initial_filters_and_query_fetch_on_mount() {
    let api = MockSearchApi::new();
    let handle = SearchSession::spawn(
        api.clone(),
        SearchConfig::default().with_per_page(12),
        InitialSearch::default()
            .with_query("sunscreen")
            .with_filters(FilterSet::new().with_concern("pigmentation"))
            .with_sort(SortKey::NameAsc),
        SilentReporter,
    );

    let call = api.next_call().await;
    assert_eq!(call.param("per_page").as_deref(), Some("12"));
    assert_eq!(call.param("concern").as_deref(), Some("pigmentation"));
    assert_eq!(call.param("sort").as_deref(), Some("name"));

    call.respond_items(products("sunscreen", 0, 12));
    let state = wait_state(&handle, |s| s.items.len() == 12).await;
    assert!(state.has_more);
}

// =============================================================================
// Failures and retry
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_first_page_failure_then_retry() {
    let api = MockSearchApi::new();
    let handle = spawn(&api);

    handle.on_query_text_changed("soap").unwrap();
    api.next_call()
        .await
        .respond(Err(AppError::Timeout(30)));

    let state = wait_state(&handle, |s| s.status == SearchStatus::Error).await;
    assert!(state.shows_retry());
    assert!(!state.has_more);
    let error = state.error.expect("error should be set");
    assert!(error.retryable);
    assert_eq!(error.page, 1);

    handle.retry().unwrap();
    let call = api.next_call().await;
    assert_eq!(call.param("page").as_deref(), Some("1"));
    call.respond_items(products("soap", 0, 8));

    let state = wait_state(&handle, |s| s.status == SearchStatus::Idle).await;
    assert_eq!(state.items.len(), 8);
    assert!(state.error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_load_more_failure_keeps_items_and_retry_continues() {
    let api = MockSearchApi::new();
    let handle = spawn(&api);
    search_with_first_page(&api, &handle, "soap", 20).await;

    handle.on_scrolled_near_bottom().unwrap();
    api.next_call()
        .await
        .respond(Err(AppError::NetworkError("connection refused".to_string())));

    let state = wait_state(&handle, |s| s.status == SearchStatus::Error).await;
    assert_eq!(state.items.len(), 20, "loaded pages survive a failure");
    assert!(!state.has_more);
    assert!(!state.shows_retry());

    // Scrolling does not hammer a failing backend.
    handle.on_scrolled_near_bottom().unwrap();
    sleep(Duration::from_secs(1)).await;
    assert_eq!(api.call_count(), 2);

    handle.retry().unwrap();
    let call = api.next_call().await;
    assert_eq!(call.param("page").as_deref(), Some("2"));
    call.respond_items(products("soap", 20, 3));

    let state = wait_state(&handle, |s| s.status == SearchStatus::Idle).await;
    assert_eq!(state.items.len(), 23);
    assert!(!state.has_more);
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_close_drops_pending_work() {
    let api = MockSearchApi::new();
    let handle = spawn(&api);

    handle.on_query_text_changed("soap").unwrap();
    let call = api.next_call().await;
    handle.close();

    call.respond_items(products("soap", 0, 20));
    sleep(Duration::from_secs(1)).await;

    assert!(handle.snapshot().items.is_empty());
    assert!(matches!(
        handle.on_scrolled_near_bottom(),
        Err(AppError::SessionClosed)
    ));
    assert!(matches!(handle.retry(), Err(AppError::SessionClosed)));
}

#[tokio::test(start_paused = true)]
async fn test_subscriber_sees_loading_then_results() {
    let api = MockSearchApi::new();
    let handle = spawn(&api);
    let mut rx = handle.subscribe();

    handle.on_query_text_changed("serum").unwrap();
    let call = api.next_call().await;

    timeout(WAIT, rx.wait_for(|s| s.status == SearchStatus::InitialLoading))
        .await
        .unwrap()
        .unwrap();

    call.respond_items(products("serum", 0, 1));
    let state = timeout(WAIT, rx.wait_for(|s| s.status == SearchStatus::Idle && !s.items.is_empty()))
        .await
        .unwrap()
        .unwrap()
        .clone();
    assert_eq!(state.items[0].id, "serum-0");
}
