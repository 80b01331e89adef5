//! Integration tests for the reactive host
//!
//! Drives an `EffectScope` and the `Store` it creates the way a hook does:
//! effects started on dependency change feed actions back, and a guard
//! evaluated under the state lock keeps superseded work from landing.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use composable_fetch_core::{async_effect, effect::Effect, reducer::Reducer, smallvec, SmallVec};
use composable_fetch_runtime::{Cleanup, EffectScope, ReactiveHost, Store, StoreConfig};
use proptest::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq)]
struct Page {
    loading: bool,
    content: Option<String>,
}

#[derive(Debug, Clone)]
enum PageAction {
    Load,
    Loaded(String),
}

#[derive(Clone)]
struct PageReducer;

impl Reducer for PageReducer {
    type State = Page;
    type Action = PageAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            PageAction::Load => {
                *state = Page {
                    loading: true,
                    content: None,
                };
            },
            PageAction::Loaded(content) => {
                *state = Page {
                    loading: false,
                    content: Some(content),
                };
            },
        }
        smallvec![Effect::None]
    }
}

type PageStore = Store<Page, PageAction, (), PageReducer>;

/// Start loading `name` after `delay`, guarded by a liveness flag.
async fn start(
    scope: &mut EffectScope<&'static str>,
    store: &PageStore,
    name: &'static str,
    delay: Duration,
) {
    let mut live = None;
    let ran = scope.on_dependencies_changed(name, || {
        let flag = Arc::new(AtomicBool::new(true));
        live = Some(Arc::clone(&flag));
        let cleanup: Cleanup = Box::new(move || flag.store(false, Ordering::Release));
        cleanup
    });
    let Some(live) = live else {
        assert!(!ran);
        return;
    };

    store.send(PageAction::Load).await.unwrap();

    let feedback = store.clone();
    store
        .run_effect(async_effect! {
            tokio::time::sleep(delay).await;
            let _ = feedback
                .send_if(PageAction::Loaded(name.to_string()), || live.load(Ordering::Acquire))
                .await;
            None
        })
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_scope_store_round_trip() {
    let mut scope = EffectScope::new();
    let store = scope.use_reduced_state(PageReducer, Page::default(), ());

    start(&mut scope, &store, "home", Duration::from_millis(5)).await;
    assert!(store.state(|page| page.loading).await);

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(
        store.state(Clone::clone).await,
        Page {
            loading: false,
            content: Some("home".into())
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_superseded_effect_is_guarded_out() {
    let mut scope = EffectScope::new();
    let store = scope.use_reduced_state(PageReducer, Page::default(), ());
    let mut actions = store.subscribe_actions();

    start(&mut scope, &store, "slow", Duration::from_millis(100)).await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    start(&mut scope, &store, "fast", Duration::from_millis(10)).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(
        store.state(|page| page.content.clone()).await,
        Some("fast".to_string())
    );

    let mut loaded = Vec::new();
    while let Ok(action) = actions.try_recv() {
        if let PageAction::Loaded(name) = action {
            loaded.push(name);
        }
    }
    assert_eq!(loaded, vec!["fast".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_teardown_then_shutdown() {
    let mut scope = EffectScope::with_store_config(StoreConfig::default().with_broadcast_capacity(4));
    let store = scope.use_reduced_state(PageReducer, Page::default(), ());

    start(&mut scope, &store, "page", Duration::from_millis(50)).await;
    scope.teardown();

    store.shutdown(Duration::from_secs(1)).await.unwrap();
    assert_eq!(
        store.state(Clone::clone).await,
        Page {
            loading: true,
            content: None
        }
    );
}

proptest! {
    #[test]
    fn prop_effect_runs_once_per_dependency_change(deps in proptest::collection::vec(0u8..4, 0..40)) {
        let mut scope = EffectScope::new();
        let mut expected = 0u64;
        let mut previous = None;

        for dep in deps {
            if previous != Some(dep) {
                expected += 1;
            }
            previous = Some(dep);
            scope.on_dependencies_changed(dep, || Box::new(|| ()));
        }

        prop_assert_eq!(scope.runs(), expected);
        prop_assert_eq!(scope.is_active(), expected > 0);
    }
}
