//! Observed request state, the events that move it, and the reducer.
//!
//! The state is a real sum type: a payload exists only in `Success`, an
//! error only in `Error`, and neither while idle or loading.

use crate::error::FetchError;
use composable_fetch_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Bare status tag of a [`RequestState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Nothing requested yet
    Idle,
    /// Request in flight
    Loading,
    /// Last request failed
    Error,
    /// Last request succeeded
    Success,
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Error => "error",
            Self::Success => "success",
        })
    }
}

/// The value observers render.
#[derive(Debug)]
pub enum RequestState<T> {
    /// Nothing requested yet
    Idle,
    /// Request in flight
    Loading,
    /// The activation failed
    Error(FetchError),
    /// The activation succeeded with the parsed body
    Success(Arc<T>),
}

impl<T> RequestState<T> {
    /// Status tag
    #[must_use]
    pub const fn status(&self) -> RequestStatus {
        match self {
            Self::Idle => RequestStatus::Idle,
            Self::Loading => RequestStatus::Loading,
            Self::Error(_) => RequestStatus::Error,
            Self::Success(_) => RequestStatus::Success,
        }
    }

    /// Parsed body, present only on success
    #[must_use]
    pub const fn data(&self) -> Option<&Arc<T>> {
        match self {
            Self::Success(data) => Some(data),
            _ => None,
        }
    }

    /// Failure, present only on error
    #[must_use]
    pub const fn error(&self) -> Option<&FetchError> {
        match self {
            Self::Error(error) => Some(error),
            _ => None,
        }
    }
}

impl<T> Clone for RequestState<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Idle => Self::Idle,
            Self::Loading => Self::Loading,
            Self::Error(error) => Self::Error(error.clone()),
            Self::Success(data) => Self::Success(Arc::clone(data)),
        }
    }
}

impl<T> Default for RequestState<T> {
    fn default() -> Self {
        Self::Idle
    }
}

/// Transient reducer input.
#[derive(Debug)]
pub enum RequestEvent<T> {
    /// An activation started
    Loading,
    /// The activation failed
    Error(FetchError),
    /// The activation produced a parsed body
    Success(Arc<T>),
    /// An event whose status tag was not recognized
    Unknown,
}

impl<T> RequestEvent<T> {
    /// Status tag this event moves the state to, if recognized
    #[must_use]
    pub const fn status(&self) -> Option<RequestStatus> {
        match self {
            Self::Loading => Some(RequestStatus::Loading),
            Self::Error(_) => Some(RequestStatus::Error),
            Self::Success(_) => Some(RequestStatus::Success),
            Self::Unknown => None,
        }
    }
}

impl<T> Clone for RequestEvent<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Loading => Self::Loading,
            Self::Error(error) => Self::Error(error.clone()),
            Self::Success(data) => Self::Success(Arc::clone(data)),
            Self::Unknown => Self::Unknown,
        }
    }
}

/// Error message carried by an `error` event in its tagged wire form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ReportedError(pub String);

/// Tagged wire form: `{"type": "loading" | "success" | "error", ...}`.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum WireEvent<T> {
    Loading,
    Success { data: T },
    Error { error: String },
    #[serde(other)]
    Unknown,
}

impl<'de, T> Deserialize<'de> for RequestEvent<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match WireEvent::<T>::deserialize(deserializer)? {
            WireEvent::Loading => Self::Loading,
            WireEvent::Success { data } => Self::Success(Arc::new(data)),
            WireEvent::Error { error } => Self::Error(FetchError::transport(ReportedError(error))),
            WireEvent::Unknown => Self::Unknown,
        })
    }
}

/// Pure transition function over [`RequestState`].
///
/// Keyed only on the event tag. `Success` and `Error` replace the state
/// wholesale; `Unknown` leaves it untouched.
pub struct FetchReducer<T> {
    _payload: PhantomData<fn() -> T>,
}

impl<T> FetchReducer<T> {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _payload: PhantomData,
        }
    }
}

impl<T> Default for FetchReducer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for FetchReducer<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FetchReducer<T> {}

impl<T> fmt::Debug for FetchReducer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FetchReducer")
    }
}

impl<T> Reducer for FetchReducer<T> {
    type State = RequestState<T>;
    type Action = RequestEvent<T>;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            RequestEvent::Loading => *state = RequestState::Loading,
            RequestEvent::Error(error) => *state = RequestState::Error(error),
            RequestEvent::Success(data) => *state = RequestState::Success(data),
            RequestEvent::Unknown => {
                tracing::trace!("Ignoring event with unrecognized status");
            },
        }

        smallvec![Effect::None]
    }
}
