//! Test utilities and mock implementations for integration tests.
//!
//! Provides a scripted `ProductSearchApi` for testing `SearchSession`
//! without a storefront.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use aisle_core::traits::ProductSearchApi;
use aisle_core::{AppError, Product, ProductPage, ProductQuery};
use tokio::sync::{oneshot, watch};
use tokio::time::timeout;

/// Upper bound for anything a test waits on. Virtual time, so generous.
pub const WAIT: Duration = Duration::from_secs(10);

// =============================================================================
// MockSearchApi
// =============================================================================

/// A request the session made that the test has not answered yet.
pub struct PendingCall {
    pub query: ProductQuery,
    responder: oneshot::Sender<Result<ProductPage, AppError>>,
}

impl PendingCall {
    /// Completes the request with `result`.
    pub fn respond(self, result: Result<ProductPage, AppError>) {
        // The session may already have been closed.
        let _ = self.responder.send(result);
    }

    pub fn respond_items(self, items: Vec<Product>) {
        self.respond(Ok(ProductPage::new(items)));
    }

    /// Returns the value of a query string parameter, if sent.
    pub fn param(&self, key: &str) -> Option<String> {
        self.query
            .to_params()
            .into_iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }
}

/// Mock search API that parks every call until the test responds to it.
#[derive(Clone)]
pub struct MockSearchApi {
    pending: Arc<Mutex<VecDeque<PendingCall>>>,
    history: Arc<Mutex<Vec<ProductQuery>>>,
    calls: Arc<watch::Sender<usize>>,
}

impl MockSearchApi {
    pub fn new() -> Self {
        let (calls, _) = watch::channel(0);
        Self {
            pending: Arc::new(Mutex::new(VecDeque::new())),
            history: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(calls),
        }
    }

    /// Total number of requests made so far.
    pub fn call_count(&self) -> usize {
        *self.calls.borrow()
    }

    /// Every query the session has sent, oldest first.
    pub fn history(&self) -> Vec<ProductQuery> {
        self.history.lock().unwrap().clone()
    }

    /// Waits until at least `count` requests have been made.
    pub async fn wait_for_calls(&self, count: usize) {
        let mut rx = self.calls.subscribe();
        timeout(WAIT, rx.wait_for(|n| *n >= count))
            .await
            .unwrap_or_else(|_| panic!("expected {} calls, saw {}", count, self.call_count()))
            .unwrap();
    }

    /// Waits for the next unanswered request and takes it.
    pub async fn next_call(&self) -> PendingCall {
        let answered = self.call_count() - self.pending.lock().unwrap().len();
        self.wait_for_calls(answered + 1).await;
        self.pending
            .lock()
            .unwrap()
            .pop_front()
            .expect("a call should be pending")
    }
}

impl Default for MockSearchApi {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductSearchApi for MockSearchApi {
    async fn search(&self, query: &ProductQuery) -> Result<ProductPage, AppError> {
        let (tx, rx) = oneshot::channel();
        self.history.lock().unwrap().push(query.clone());
        self.pending.lock().unwrap().push_back(PendingCall {
            query: query.clone(),
            responder: tx,
        });
        self.calls.send_modify(|n| *n += 1);

        rx.await
            .unwrap_or_else(|_| Err(AppError::Generic("mock responder dropped".to_string())))
    }
}

// =============================================================================
// Product builders
// =============================================================================

pub fn product(id: &str, name: &str) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        brand: Some("Aisle Labs".to_string()),
        price: 2450.0,
        currency: "LKR".to_string(),
        hero_image: None,
        slug: Some(id.to_string()),
        sku: None,
        stock: 12,
        category: Some("skincare".to_string()),
        item_type: None,
    }
}

/// `count` products named after `label`, with ids unique across `offset`.
pub fn products(label: &str, offset: usize, count: usize) -> Vec<Product> {
    (offset..offset + count)
        .map(|i| product(&format!("{}-{}", label, i), &format!("{} #{}", label, i)))
        .collect()
}
