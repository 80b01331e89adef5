//! Scripted HTTP transport for deterministic tests.
//!
//! Responses are registered per URL and replayed on every call, with an
//! optional delay so tests running under paused tokio time can order
//! completions exactly.

use composable_fetch_core::transport::{
    HttpRequest, HttpTransport, TransportFuture, TransportResponse,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;

/// Errors raised by [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MockTransportError {
    /// Scripted rejection
    #[error("{0}")]
    Rejected(String),

    /// No response was registered for the URL
    #[error("No mock response registered for {0}")]
    Unrouted(String),
}

#[derive(Debug, Clone)]
enum Outcome {
    Respond { status: u16, body: Vec<u8> },
    Missing,
    Reject(String),
}

/// One scripted reply.
#[derive(Debug, Clone)]
pub struct MockResponse {
    outcome: Outcome,
    delay: Duration,
    body_delay: Duration,
}

impl MockResponse {
    /// `200` with `value` serialized as the body
    #[must_use]
    pub fn json(value: &serde_json::Value) -> Self {
        Self::status(200, value.to_string())
    }

    /// Arbitrary status and raw body
    #[must_use]
    pub fn status(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self::from_outcome(Outcome::Respond {
            status,
            body: body.into(),
        })
    }

    /// The transport resolves with no response at all
    #[must_use]
    pub fn missing() -> Self {
        Self::from_outcome(Outcome::Missing)
    }

    /// The transport fails with [`MockTransportError::Rejected`]
    #[must_use]
    pub fn reject(message: impl Into<String>) -> Self {
        Self::from_outcome(Outcome::Reject(message.into()))
    }

    /// Delay before the transport resolves
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Delay before the body finishes reading
    #[must_use]
    pub const fn with_body_delay(mut self, delay: Duration) -> Self {
        self.body_delay = delay;
        self
    }

    const fn from_outcome(outcome: Outcome) -> Self {
        Self {
            outcome,
            delay: Duration::ZERO,
            body_delay: Duration::ZERO,
        }
    }
}

/// Response handed out by [`MockTransport`].
#[derive(Debug)]
pub struct MockHttpResponse {
    status: u16,
    body: Vec<u8>,
    body_delay: Duration,
    body_reads: Arc<Mutex<usize>>,
}

impl TransportResponse for MockHttpResponse {
    type Error = MockTransportError;

    fn status(&self) -> u16 {
        self.status
    }

    fn body(self) -> TransportFuture<'static, Vec<u8>, Self::Error> {
        Box::pin(async move {
            if !self.body_delay.is_zero() {
                tokio::time::sleep(self.body_delay).await;
            }
            *self.body_reads.lock().unwrap_or_else(PoisonError::into_inner) += 1;
            Ok(self.body)
        })
    }
}

/// In-memory [`HttpTransport`] with per-URL scripted replies.
///
/// Every request is recorded, including those that end up rejected.
///
/// # Example
///
/// ```
/// use composable_fetch_testing::{MockResponse, MockTransport};
/// use serde_json::json;
///
/// let transport = MockTransport::new()
///     .respond("https://api.test/todo", MockResponse::json(&json!({"id": 1})));
/// assert_eq!(transport.call_count(), 0);
/// ```
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<String, MockResponse>>,
    calls: Mutex<Vec<HttpRequest>>,
    body_reads: Arc<Mutex<usize>>,
}

impl MockTransport {
    /// Transport with no routes
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the reply for `url`
    #[must_use]
    pub fn respond(self, url: impl Into<String>, response: MockResponse) -> Self {
        self.set_response(url, response);
        self
    }

    /// Register (or replace) the reply for `url` on a shared transport
    pub fn set_response(&self, url: impl Into<String>, response: MockResponse) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.into(), response);
    }

    /// All requests sent so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<HttpRequest> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests sent so far
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Number of requests sent to `url`
    #[must_use]
    pub fn calls_to(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|request| request.url == url)
            .count()
    }

    /// Number of response bodies that were read to completion
    #[must_use]
    pub fn body_reads(&self) -> usize {
        *self.body_reads.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HttpTransport for MockTransport {
    type Response = MockHttpResponse;
    type Error = MockTransportError;

    fn send(&self, request: HttpRequest) -> TransportFuture<'_, Option<Self::Response>, Self::Error> {
        let scripted = self
            .routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&request.url)
            .cloned();
        let url = request.url.clone();
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        let body_reads = Arc::clone(&self.body_reads);

        Box::pin(async move {
            let Some(scripted) = scripted else {
                return Err(MockTransportError::Unrouted(url));
            };

            if !scripted.delay.is_zero() {
                tokio::time::sleep(scripted.delay).await;
            }

            match scripted.outcome {
                Outcome::Respond { status, body } => Ok(Some(MockHttpResponse {
                    status,
                    body,
                    body_delay: scripted.body_delay,
                    body_reads,
                })),
                Outcome::Missing => Ok(None),
                Outcome::Reject(message) => Err(MockTransportError::Rejected(message)),
            }
        })
    }
}
