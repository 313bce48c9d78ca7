//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use drf_resource::clients::{
    Headers, RequestConfig, Transport, TransportError, TransportResponse,
};
use parking_lot::Mutex;
use serde_json::Value;

type Scripted = Result<TransportResponse, TransportError>;

/// In-memory transport answering from per-URL queues of scripted responses.
///
/// Every request is recorded. A request for a URL with no scripted response
/// left fails with a network error.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: Mutex<HashMap<String, VecDeque<Scripted>>>,
    requests: Mutex<Vec<RequestConfig>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues a `200 OK` with `data` for `url`.
    pub fn respond(&self, url: &str, data: Value) {
        self.push(url, Ok(TransportResponse::ok(data)));
    }

    /// Queues a response with `status`, `headers` and `data` for `url`.
    pub fn respond_with(&self, url: &str, status: u16, headers: Headers, data: Value) {
        self.push(url, Ok(TransportResponse::new(status, headers, data)));
    }

    /// Queues a rejected response with `status` for `url`.
    pub fn fail(&self, url: &str, status: u16, data: Value) {
        self.push(
            url,
            Err(TransportError::Status {
                status,
                url: url.to_string(),
                data,
                headers: Headers::new(),
            }),
        );
    }

    fn push(&self, url: &str, response: Scripted) {
        self.responses
            .lock()
            .entry(url.to_string())
            .or_default()
            .push_back(response);
    }

    /// Returns every request received so far.
    pub fn requests(&self) -> Vec<RequestConfig> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn last_request(&self) -> RequestConfig {
        self.requests
            .lock()
            .last()
            .cloned()
            .expect("no request was made")
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn request(&self, config: RequestConfig) -> Result<TransportResponse, TransportError> {
        self.requests.lock().push(config.clone());
        let scripted = self
            .responses
            .lock()
            .get_mut(&config.url)
            .and_then(VecDeque::pop_front);
        scripted.unwrap_or_else(|| {
            Err(TransportError::Network {
                url: config.url.clone(),
                message: "no scripted response".to_string(),
            })
        })
    }
}

/// Counts callback invocations.
#[derive(Debug, Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}
