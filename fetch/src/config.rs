//! Fetch controller configuration.

use std::time::Duration;

/// What happens to an error from an activation that is no longer current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StaleErrorPolicy {
    /// Drop it, exactly like a stale success
    #[default]
    Suppress,
    /// Dispatch it anyway, possibly overwriting a newer state
    Dispatch,
}

/// Configuration for [`UseFetch`](crate::UseFetch).
///
/// # Example
///
/// ```
/// use composable_fetch::{FetchConfig, StaleErrorPolicy};
/// use std::time::Duration;
///
/// let config = FetchConfig::new()
///     .with_timeout(Duration::from_secs(10))
///     .with_abort_in_flight(true);
///
/// assert_eq!(config.stale_errors, StaleErrorPolicy::Suppress);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FetchConfig {
    /// Treatment of errors from superseded activations (default: suppress)
    pub stale_errors: StaleErrorPolicy,

    /// Abort the transport future of a superseded activation (default: false)
    ///
    /// When false, a superseded request runs to completion and its outcome
    /// is discarded.
    pub abort_in_flight: bool,

    /// Upper bound on one activation, request and body read together
    /// (default: none)
    pub timeout: Option<Duration>,
}

impl FetchConfig {
    /// Default configuration
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stale_errors: StaleErrorPolicy::Suppress,
            abort_in_flight: false,
            timeout: None,
        }
    }

    /// Set the stale error policy
    #[must_use]
    pub const fn with_stale_errors(mut self, policy: StaleErrorPolicy) -> Self {
        self.stale_errors = policy;
        self
    }

    /// Enable or disable aborting superseded requests
    #[must_use]
    pub const fn with_abort_in_flight(mut self, abort: bool) -> Self {
        self.abort_in_flight = abort;
        self
    }

    /// Bound each activation by `timeout`
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
