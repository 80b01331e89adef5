//! Error types surfaced through `RequestState::Error`.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single fetch activation.
///
/// Never returned from a call: observers only see it inside
/// [`RequestState::Error`](crate::RequestState::Error).
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// No response, or a response whose status is outside 2xx
    ///
    /// Status, headers and body are deliberately not retained.
    #[error("Request failed")]
    RequestFailed,

    /// The transport raised an error; carried as-is
    #[error(transparent)]
    Transport(Arc<dyn std::error::Error + Send + Sync>),

    /// The response body was not valid JSON for the requested type
    #[error(transparent)]
    Parse(Arc<serde_json::Error>),

    /// The configured request timeout elapsed
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

impl FetchError {
    /// Wrap a transport error without altering it.
    pub fn transport<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport(Arc::new(error))
    }

    /// Borrow the original transport error as a concrete type.
    #[must_use]
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            Self::Transport(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(error: serde_json::Error) -> Self {
        Self::Parse(Arc::new(error))
    }
}
