//! # Composable Fetch
//!
//! Fetch state for UI components: one HTTP request per distinct set of
//! inputs, observed as `idle`, `loading`, `success` or `error`.
//!
//! - [`UseFetch`] is the controller a component holds
//! - [`RequestState`] is what it renders
//! - [`FetchReducer`] is the pure transition function behind it
//! - [`ReqwestTransport`] is the default [`HttpTransport`]
//!
//! Only the most recent activation may publish an outcome. A request
//! whose inputs changed (or whose component was torn down) before it
//! finished is discarded, success and (by default) failure alike.
//!
//! ## Example
//!
//! ```no_run
//! use composable_fetch::{HttpMethod, RequestOptions, ReqwestTransport, UseFetch};
//! use serde::Deserialize;
//! use std::time::Duration;
//!
//! #[derive(Debug, Deserialize)]
//! struct Todo {
//!     id: u64,
//!     title: String,
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = RequestOptions::new()
//!     .with_header("accept", "application/json")
//!     .shared();
//! let mut todo = UseFetch::<Todo, _>::new(ReqwestTransport::new());
//!
//! todo.observe("https://example.com/todos/1", HttpMethod::Get, Some(&options))
//!     .await;
//! let state = todo.settled(Duration::from_secs(5)).await?;
//!
//! if let Some(todo) = state.data() {
//!     println!("{}: {}", todo.id, todo.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod metrics;
pub mod state;
pub mod transport;

pub use composable_fetch_core::transport::{
    HttpMethod, HttpRequest, HttpTransport, RequestOptions, TransportResponse,
};
pub use config::{FetchConfig, StaleErrorPolicy};
pub use controller::{FetchDependencies, UseFetch};
pub use error::FetchError;
pub use state::{FetchReducer, ReportedError, RequestEvent, RequestState, RequestStatus};
pub use transport::{ReqwestResponse, ReqwestTransport};
