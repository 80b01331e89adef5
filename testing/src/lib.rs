//! # Composable Fetch Testing
//!
//! Testing utilities for reducers and for code that talks to an
//! [`HttpTransport`](composable_fetch_core::transport::HttpTransport).
//!
//! This crate provides:
//! - [`ReducerTest`]: Given-When-Then harness for pure reducers
//! - [`MockTransport`]: scripted per-URL replies with delays, recorded calls
//!
//! ## Example
//!
//! ```ignore
//! use composable_fetch::UseFetch;
//! use composable_fetch_testing::{MockResponse, MockTransport};
//! use serde_json::json;
//!
//! #[tokio::test(start_paused = true)]
//! async fn test_loads_todo() {
//!     let transport = MockTransport::new()
//!         .respond("https://api.test/todo", MockResponse::json(&json!({"id": 1})));
//!     let mut fetch = UseFetch::<serde_json::Value, _>::new(transport);
//!
//!     fetch.observe_get("https://api.test/todo").await;
//!     let state = fetch.settled(Duration::from_secs(1)).await.unwrap();
//!     assert!(state.data().is_some());
//! }
//! ```

mod reducer_test;
mod transport_mocks;

pub use reducer_test::{assertions, ReducerTest};
pub use transport_mocks::{MockHttpResponse, MockResponse, MockTransport, MockTransportError};
