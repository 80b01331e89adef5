//! HTTP transport environment for the fetch controller.
//!
//! The controller never talks to the network directly. It builds an
//! [`HttpRequest`] and hands it to an injected [`HttpTransport`], which
//! resolves to an optional [`TransportResponse`].
//!
//! # Implementations
//!
//! - `ReqwestTransport` (in `composable-fetch` crate): Production implementation
//! - `MockTransport` (in `composable-fetch-testing` crate): Scripted, deterministic testing
//!
//! # Method precedence
//!
//! [`RequestOptions`] may carry a method of its own. When a request is built
//! with [`HttpRequest::new`], the explicit method argument always wins.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Boxed future returned by transport operations.
pub type TransportFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// HTTP methods the controller can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `GET` (the default)
    #[default]
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl HttpMethod {
    /// Upper-case wire name of the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unsupported method name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported HTTP method: {0}")]
pub struct ParseMethodError(pub String);

impl FromStr for HttpMethod {
    type Err = ParseMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Get, Self::Post, Self::Put, Self::Patch, Self::Delete]
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseMethodError(s.to_string()))
    }
}

/// Transport configuration passed through verbatim to the transport.
///
/// Hold these behind an [`Arc`] that stays the same between observations:
/// the controller compares options by reference, so a freshly built but
/// identical value starts a new request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Method embedded in the options; overridden by the controller's method
    pub method: Option<HttpMethod>,
    /// Request headers in insertion order (duplicates allowed)
    pub headers: Vec<(String, String)>,
    /// Raw request body
    pub body: Option<Vec<u8>>,
}

impl RequestOptions {
    /// Empty options
    #[must_use]
    pub const fn new() -> Self {
        Self {
            method: None,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the raw body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body and set `content-type` accordingly.
    ///
    /// # Errors
    ///
    /// Returns the serialization error if `value` cannot be encoded as JSON.
    pub fn with_json_body<B: Serialize + ?Sized>(self, value: &B) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        Ok(self
            .with_header("content-type", "application/json")
            .with_body(body))
    }

    /// Set an embedded method (the controller's method still takes precedence)
    #[must_use]
    pub const fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    /// Wrap in an [`Arc`] so it can be handed to the controller repeatedly.
    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

/// A fully resolved request as seen by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Target URL, unvalidated
    pub url: String,
    /// Effective method
    pub method: HttpMethod,
    /// Headers copied from the options
    pub headers: Vec<(String, String)>,
    /// Body copied from the options
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Build a request; `method` overrides any method embedded in `options`.
    #[must_use]
    pub fn new(url: impl Into<String>, method: HttpMethod, options: Option<&RequestOptions>) -> Self {
        let (headers, body) = options
            .map(|opts| (opts.headers.clone(), opts.body.clone()))
            .unwrap_or_default();

        Self {
            url: url.into(),
            method,
            headers,
            body,
        }
    }
}

/// A response handed back by a transport.
pub trait TransportResponse: Send + 'static {
    /// Error raised while reading the body
    type Error: std::error::Error + Send + Sync + 'static;

    /// HTTP status code
    fn status(&self) -> u16;

    /// Whether the status is in the success (2xx) range
    fn ok(&self) -> bool {
        (200..300).contains(&self.status())
    }

    /// Read the full body.
    ///
    /// This is the second suspension point of a fetch, after [`HttpTransport::send`].
    fn body(self) -> TransportFuture<'static, Vec<u8>, Self::Error>;
}

/// Network transport - abstracts HTTP for testability
///
/// Resolving to `Ok(None)` means the transport produced no response at all;
/// the controller treats that exactly like a failed status.
pub trait HttpTransport: Send + Sync + 'static {
    /// Response type produced by this transport
    type Response: TransportResponse;

    /// Error raised when the request cannot be performed
    type Error: std::error::Error + Send + Sync + 'static;

    /// Issue a single request.
    ///
    /// # Errors
    ///
    /// Returns the transport's error when the request could not be sent or
    /// the connection failed.
    fn send(&self, request: HttpRequest) -> TransportFuture<'_, Option<Self::Response>, Self::Error>;
}

impl<T: HttpTransport> HttpTransport for Arc<T> {
    type Response = T::Response;
    type Error = T::Error;

    fn send(&self, request: HttpRequest) -> TransportFuture<'_, Option<Self::Response>, Self::Error> {
        (**self).send(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_method_display_and_parse() {
        assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
        assert_eq!("delete".parse::<HttpMethod>(), Ok(HttpMethod::Delete));
        assert_eq!(
            "TRACE".parse::<HttpMethod>(),
            Err(ParseMethodError("TRACE".to_string()))
        );
        assert_eq!(HttpMethod::default(), HttpMethod::Get);
    }

    #[test]
    fn test_method_serde_is_upper_case() {
        let json = serde_json::to_string(&HttpMethod::Post).unwrap_or_default();
        assert_eq!(json, "\"POST\"");
    }

    #[test]
    fn test_explicit_method_wins_over_options() {
        let options = RequestOptions::new()
            .with_method(HttpMethod::Delete)
            .with_header("accept", "application/json")
            .with_body("{}");

        let request = HttpRequest::new("https://example.test/a", HttpMethod::Put, Some(&options));

        assert_eq!(request.method, HttpMethod::Put);
        assert_eq!(request.headers, vec![("accept".to_string(), "application/json".to_string())]);
        assert_eq!(request.body.as_deref(), Some(&b"{}"[..]));
    }

    #[test]
    fn test_json_body_sets_content_type() {
        let options = RequestOptions::new()
            .with_json_body(&serde_json::json!({ "name": "widget" }))
            .unwrap_or_default();

        assert_eq!(
            options.headers,
            vec![("content-type".to_string(), "application/json".to_string())]
        );
        assert_eq!(options.body.as_deref(), Some(&br#"{"name":"widget"}"#[..]));
    }

    #[test]
    fn test_request_without_options() {
        let request = HttpRequest::new("not a url", HttpMethod::Get, None);
        assert!(request.headers.is_empty());
        assert!(request.body.is_none());
        assert_eq!(request.url, "not a url");
    }

    fn method_strategy() -> impl Strategy<Value = HttpMethod> {
        prop_oneof![
            Just(HttpMethod::Get),
            Just(HttpMethod::Post),
            Just(HttpMethod::Put),
            Just(HttpMethod::Patch),
            Just(HttpMethod::Delete),
        ]
    }

    proptest! {
        #[test]
        fn prop_explicit_method_always_wins(
            explicit in method_strategy(),
            embedded in proptest::option::of(method_strategy()),
        ) {
            let options = RequestOptions { method: embedded, ..RequestOptions::default() };
            let request = HttpRequest::new("https://example.test", explicit, Some(&options));
            prop_assert_eq!(request.method, explicit);
        }
    }
}
