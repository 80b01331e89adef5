//! The fetch controller.
//!
//! [`UseFetch`] is what a component holds. Each call to
//! [`UseFetch::observe`] is one render pass: it returns the state as it
//! was before the pass and, if the inputs changed since the previous pass,
//! supersedes the current activation and starts a new one.
//!
//! Every activation owns a liveness flag. The host's cleanup clears it
//! when the inputs change again or the controller is torn down; an
//! outcome is dispatched only if its flag is still set when the store
//! lock is taken, so a superseded request can never overwrite a newer
//! state.

use crate::config::{FetchConfig, StaleErrorPolicy};
use crate::error::FetchError;
use crate::metrics::FetchMetrics;
use crate::state::{FetchReducer, RequestEvent, RequestState};
use composable_fetch_core::async_effect;
use composable_fetch_core::effect::Effect;
use composable_fetch_core::transport::{
    HttpMethod, HttpRequest, HttpTransport, RequestOptions, TransportResponse,
};
use composable_fetch_runtime::{
    Cleanup, EffectHandle, EffectScope, Identity, ReactiveHost, Store, StoreError,
};
use futures::future::{AbortHandle, AbortRegistration, Abortable};
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::time::Instant;
use tracing::Instrument;

/// Inputs whose change starts a new activation.
///
/// Options are compared by reference: a fresh `Arc` with identical
/// contents counts as changed.
pub type FetchDependencies = (String, HttpMethod, Option<Identity<RequestOptions>>);

type FetchStore<T> = Store<RequestState<T>, RequestEvent<T>, (), FetchReducer<T>>;

struct Activation {
    live: Arc<AtomicBool>,
    abort: Option<AbortHandle>,
    registration: Option<AbortRegistration>,
}

impl Activation {
    fn new(abortable: bool) -> Self {
        let (abort, registration) = if abortable {
            let (handle, registration) = AbortHandle::new_pair();
            (Some(handle), Some(registration))
        } else {
            (None, None)
        };

        Self {
            live: Arc::new(AtomicBool::new(true)),
            abort,
            registration,
        }
    }

    fn cleanup(&self) -> Cleanup {
        let live = Arc::clone(&self.live);
        let abort = self.abort.clone();
        Box::new(move || {
            live.store(false, Ordering::Release);
            if let Some(abort) = abort {
                abort.abort();
            }
        })
    }
}

/// Fetch state controller for one component.
///
/// Issues at most one request per distinct `(url, method, options)` and
/// exposes the outcome as a [`RequestState`].
///
/// # Example
///
/// ```no_run
/// use composable_fetch::{HttpMethod, ReqwestTransport, UseFetch};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), composable_fetch_runtime::StoreError> {
/// let mut todo = UseFetch::<serde_json::Value, _>::new(ReqwestTransport::new());
///
/// let first = todo.observe("https://example.com/todo/1", HttpMethod::Get, None).await;
/// assert!(first.data().is_none());
///
/// let done = todo.settled(Duration::from_secs(5)).await?;
/// println!("{:?}", done.status());
/// # Ok(())
/// # }
/// ```
pub struct UseFetch<T, Tr, H = EffectScope<FetchDependencies>> {
    store: FetchStore<T>,
    host: H,
    transport: Arc<Tr>,
    config: FetchConfig,
    in_flight: EffectHandle,
}

impl<T, Tr> UseFetch<T, Tr>
where
    T: DeserializeOwned + Send + Sync + 'static,
    Tr: HttpTransport,
{
    /// Controller with the default configuration and host
    #[must_use]
    pub fn new(transport: Tr) -> Self {
        Self::with_config(transport, FetchConfig::default())
    }

    /// Controller with `config` and the default host
    #[must_use]
    pub fn with_config(transport: Tr, config: FetchConfig) -> Self {
        Self::with_host(transport, EffectScope::new(), config)
    }
}

impl<T, Tr, H> UseFetch<T, Tr, H>
where
    T: DeserializeOwned + Send + Sync + 'static,
    Tr: HttpTransport,
    H: ReactiveHost<FetchDependencies>,
{
    /// Controller driven by an external reactive host
    ///
    /// The state container comes from the host; the host also decides when
    /// the inputs changed and runs the activation cleanup. Dropping the
    /// controller drops the host, which is expected to run any pending
    /// cleanup.
    pub fn with_host(transport: Tr, host: H, config: FetchConfig) -> Self {
        let store = host.use_reduced_state(FetchReducer::new(), RequestState::Idle, ());
        Self {
            store,
            host,
            transport: Arc::new(transport),
            config,
            in_flight: EffectHandle::completed(),
        }
    }

    /// One render pass
    ///
    /// Returns the state observed at the start of the pass. If the inputs
    /// differ from the previous pass, the previous activation is marked
    /// stale, the state becomes `Loading`, and a request starts in the
    /// background. Errors never escape this call; they arrive as
    /// [`RequestState::Error`].
    #[tracing::instrument(skip(self, options))]
    pub async fn observe(
        &mut self,
        url: &str,
        method: HttpMethod,
        options: Option<&Arc<RequestOptions>>,
    ) -> RequestState<T> {
        let rendered = self.state().await;

        let dependencies = (
            url.to_owned(),
            method,
            options.map(|options| Identity::new(Arc::clone(options))),
        );
        let abortable = self.config.abort_in_flight;
        let mut started = None;
        self.host.on_dependencies_changed(dependencies, || {
            let activation = Activation::new(abortable);
            let cleanup = activation.cleanup();
            started = Some(activation);
            cleanup
        });

        if let Some(activation) = started {
            let request = HttpRequest::new(url, method, options.map(|options| &**options));
            self.activate(activation, request).await;
        }

        rendered
    }

    /// [`observe`](Self::observe) with `GET` and no options
    pub async fn observe_get(&mut self, url: &str) -> RequestState<T> {
        self.observe(url, HttpMethod::Get, None).await
    }

    /// Current state
    pub async fn state(&self) -> RequestState<T> {
        self.store.state(Clone::clone).await
    }

    /// Watch the state; the receiver always holds the latest value
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RequestState<T>> {
        self.store.subscribe_state()
    }

    /// Every reduced event, in reduction order
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<RequestEvent<T>> {
        self.store.subscribe_actions()
    }

    /// Wait for the most recent activation to finish, then return the state
    ///
    /// Returns immediately if nothing is in flight.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the activation is still running
    /// after `timeout`.
    pub async fn settled(&mut self, timeout: Duration) -> Result<RequestState<T>, StoreError> {
        self.in_flight.wait_with_timeout(timeout).await?;
        Ok(self.state().await)
    }

    /// Unmount: mark the current activation stale and forget the inputs
    ///
    /// Its outcome is never dispatched. The next `observe` starts a new
    /// activation even with the same inputs.
    pub fn teardown(&mut self) {
        tracing::debug!("Tearing down fetch controller");
        self.host.teardown();
    }

    /// Wait for in-flight work, then refuse further events
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if work is still running after
    /// `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        self.store.shutdown(timeout).await
    }

    /// The reactive host
    #[must_use]
    pub const fn host(&self) -> &H {
        &self.host
    }

    async fn activate(&mut self, activation: Activation, request: HttpRequest) {
        FetchMetrics::record_activation();
        tracing::debug!("Inputs changed, starting request");

        if let Err(error) = self.store.send(RequestEvent::Loading).await {
            tracing::warn!(%error, "Could not start request");
            return;
        }

        let effect = fetch_effect(
            self.store.clone(),
            Arc::clone(&self.transport),
            request,
            activation,
            &self.config,
        );
        match self.store.run_effect(effect) {
            Ok(handle) => self.in_flight = handle,
            Err(error) => tracing::warn!(%error, "Could not run request"),
        }
    }
}

fn fetch_effect<T, Tr>(
    store: FetchStore<T>,
    transport: Arc<Tr>,
    request: HttpRequest,
    activation: Activation,
    config: &FetchConfig,
) -> Effect<RequestEvent<T>>
where
    T: DeserializeOwned + Send + Sync + 'static,
    Tr: HttpTransport,
{
    let Activation {
        live, registration, ..
    } = activation;
    let timeout = config.timeout;
    let stale_errors = config.stale_errors;
    let span = tracing::debug_span!("fetch", url = %request.url, method = %request.method);

    let work = async move {
        let started = Instant::now();
        let outcome = match timeout {
            Some(limit) => tokio::time::timeout(limit, request_json(&*transport, request, &live))
                .await
                .unwrap_or_else(|_| Err(FetchError::Timeout(limit))),
            None => request_json(&*transport, request, &live).await,
        };
        dispatch(&store, outcome, &live, stale_errors, started.elapsed()).await;
    }
    .instrument(span);

    // The outcome is dispatched from inside the effect, under the liveness
    // guard, so the effect itself feeds nothing back.
    match registration {
        Some(registration) => async_effect! {
            if Abortable::new(work, registration).await.is_err() {
                FetchMetrics::record_stale_suppressed();
                tracing::debug!("Superseded request aborted");
            }
            None
        },
        None => async_effect! {
            work.await;
            None
        },
    }
}

/// `Ok(None)` means the activation went stale before the body was read.
async fn request_json<T, Tr>(
    transport: &Tr,
    request: HttpRequest,
    live: &AtomicBool,
) -> Result<Option<T>, FetchError>
where
    T: DeserializeOwned,
    Tr: HttpTransport,
{
    let response = match transport.send(request).await.map_err(FetchError::transport)? {
        Some(response) if response.ok() => response,
        Some(response) => {
            tracing::debug!(status = response.status(), "Non-success status");
            return Err(FetchError::RequestFailed);
        },
        None => {
            tracing::debug!("Transport produced no response");
            return Err(FetchError::RequestFailed);
        },
    };

    if !live.load(Ordering::Acquire) {
        tracing::debug!("Request superseded, skipping body");
        return Ok(None);
    }

    let body = response.body().await.map_err(FetchError::transport)?;
    Ok(Some(serde_json::from_slice(&body)?))
}

async fn dispatch<T>(
    store: &FetchStore<T>,
    outcome: Result<Option<T>, FetchError>,
    live: &AtomicBool,
    stale_errors: StaleErrorPolicy,
    elapsed: Duration,
) where
    T: Send + Sync + 'static,
{
    let (event, label, guarded) = match outcome {
        Ok(Some(data)) => (RequestEvent::Success(Arc::new(data)), "success", true),
        Ok(None) => {
            FetchMetrics::record_stale_suppressed();
            return;
        },
        Err(error) => {
            tracing::debug!(%error, "Request failed");
            let guarded = stale_errors == StaleErrorPolicy::Suppress;
            (RequestEvent::Error(error), "error", guarded)
        },
    };

    let current = || !guarded || live.load(Ordering::Acquire);
    match store.send_if(event, current).await {
        Ok(Some(_)) => FetchMetrics::record_completion(label, elapsed),
        Ok(None) => {
            FetchMetrics::record_stale_suppressed();
            tracing::debug!(outcome = label, "Discarded outcome of superseded request");
        },
        Err(error) => tracing::debug!(%error, "Store refused outcome"),
    }
}
