//! Reactive host: dependency-tracked effects and reducer-driven state.
//!
//! A component-based renderer gives its hooks two primitives:
//!
//! - an effect that runs after a pass whenever its dependency list changed,
//!   returning a cleanup that runs before the next run (or on teardown);
//! - a state container driven by a reducer, notifying observers on change.
//!
//! [`ReactiveHost`] names both. [`EffectScope`] is the tokio-backed
//! implementation used by default; the state container is the crate's
//! [`Store`].
//!
//! # Example
//!
//! ```
//! use composable_fetch_runtime::host::{EffectScope, ReactiveHost};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let cleanups = Arc::new(AtomicUsize::new(0));
//! let mut scope = EffectScope::new();
//!
//! for deps in ["a", "a", "b"] {
//!     let cleanups = Arc::clone(&cleanups);
//!     scope.on_dependencies_changed(deps, move || {
//!         Box::new(move || {
//!             cleanups.fetch_add(1, Ordering::SeqCst);
//!         })
//!     });
//! }
//!
//! assert_eq!(scope.runs(), 2);
//! assert_eq!(cleanups.load(Ordering::SeqCst), 1);
//! ```

use crate::{Store, StoreConfig};
use composable_fetch_core::reducer::Reducer;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Cleanup returned by an effect; runs before the next run or on teardown.
pub type Cleanup = Box<dyn FnOnce() + Send>;

/// A dependency compared by reference identity rather than by value.
///
/// Two `Identity` values are equal only when they point at the same
/// allocation, so a structurally equal value built anew counts as changed.
pub struct Identity<T: ?Sized>(Arc<T>);

impl<T: ?Sized> Identity<T> {
    /// Wrap a shared value
    #[must_use]
    pub const fn new(value: Arc<T>) -> Self {
        Self(value)
    }
}

impl<T: ?Sized> Clone for Identity<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: ?Sized> PartialEq for Identity<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: ?Sized> Eq for Identity<T> {}

impl<T: ?Sized> Deref for Identity<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized> From<Arc<T>> for Identity<T> {
    fn from(value: Arc<T>) -> Self {
        Self(value)
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Identity<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Identity")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .field(&&*self.0)
            .finish()
    }
}

/// The capabilities a hook borrows from its rendering host.
pub trait ReactiveHost<D: PartialEq> {
    /// Run `effect` if `deps` differ from the dependencies of the previous run.
    ///
    /// Before `effect` runs, the cleanup of the previous run is invoked.
    /// Returns whether the effect ran.
    fn on_dependencies_changed<F>(&mut self, deps: D, effect: F) -> bool
    where
        F: FnOnce() -> Cleanup;

    /// Create the reducer-driven state container for a hook.
    fn use_reduced_state<R>(
        &self,
        reducer: R,
        initial: R::State,
        environment: R::Environment,
    ) -> Store<R::State, R::Action, R::Environment, R>
    where
        R: Reducer + Send + Sync + 'static,
        R::State: Send + Sync + Clone + 'static,
        R::Action: Send + Clone + 'static,
        R::Environment: Send + Sync + 'static;

    /// Run the pending cleanup and forget the dependencies.
    ///
    /// The next call to [`ReactiveHost::on_dependencies_changed`] always runs.
    fn teardown(&mut self);
}

/// Single dependency-tracked effect slot.
///
/// Dropping the scope tears it down.
pub struct EffectScope<D> {
    deps: Option<D>,
    cleanup: Option<Cleanup>,
    runs: u64,
    store_config: StoreConfig,
}

impl<D> EffectScope<D> {
    /// Empty scope; containers it creates use the default [`StoreConfig`]
    #[must_use]
    pub fn new() -> Self {
        Self::with_store_config(StoreConfig::default())
    }

    /// Empty scope whose containers use `config`
    #[must_use]
    pub const fn with_store_config(config: StoreConfig) -> Self {
        Self {
            deps: None,
            cleanup: None,
            runs: 0,
            store_config: config,
        }
    }

    /// How many times an effect has run in this scope
    #[must_use]
    pub const fn runs(&self) -> u64 {
        self.runs
    }

    /// Whether an effect ran and has not been cleaned up yet
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.cleanup.is_some()
    }

    /// Dependencies of the most recent run
    #[must_use]
    pub const fn dependencies(&self) -> Option<&D> {
        self.deps.as_ref()
    }

    fn run_cleanup(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            tracing::trace!("Running effect cleanup");
            cleanup();
        }
    }
}

impl<D> Default for EffectScope<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: PartialEq> ReactiveHost<D> for EffectScope<D> {
    fn on_dependencies_changed<F>(&mut self, deps: D, effect: F) -> bool
    where
        F: FnOnce() -> Cleanup,
    {
        if self.deps.as_ref() == Some(&deps) {
            return false;
        }

        self.run_cleanup();
        self.deps = Some(deps);
        self.runs += 1;
        tracing::trace!(run = self.runs, "Dependencies changed, running effect");
        self.cleanup = Some(effect());
        true
    }

    fn use_reduced_state<R>(
        &self,
        reducer: R,
        initial: R::State,
        environment: R::Environment,
    ) -> Store<R::State, R::Action, R::Environment, R>
    where
        R: Reducer + Send + Sync + 'static,
        R::State: Send + Sync + Clone + 'static,
        R::Action: Send + Clone + 'static,
        R::Environment: Send + Sync + 'static,
    {
        Store::with_config(initial, reducer, environment, self.store_config.clone())
    }

    fn teardown(&mut self) {
        self.run_cleanup();
        self.deps = None;
    }
}

impl<D> Drop for EffectScope<D> {
    fn drop(&mut self) {
        self.run_cleanup();
    }
}

impl<D: fmt::Debug> fmt::Debug for EffectScope<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectScope")
            .field("deps", &self.deps)
            .field("active", &self.cleanup.is_some())
            .field("runs", &self.runs)
            .finish_non_exhaustive()
    }
}
