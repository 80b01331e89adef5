//! Given-When-Then harness for reducers.
//!
//! Reducers are pure, so a test is a starting state, one action, and
//! assertions over the state and effects that come out.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use composable_fetch_core::{effect::Effect, reducer::Reducer};

type StateAssertion<S> = Box<dyn FnOnce(&S)>;

type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Fluent reducer test
///
/// # Example
///
/// ```ignore
/// use composable_fetch_testing::{assertions, ReducerTest};
///
/// ReducerTest::new(FetchReducer::<Todo>::new())
///     .with_env(())
///     .given_state(RequestState::Idle)
///     .when_action(RequestEvent::Loading)
///     .then_state(|state| assert_eq!(state.status(), RequestStatus::Loading))
///     .then_effects(|effects| assertions::assert_no_effects(effects))
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    action: Option<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Start a test for `reducer`
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            action: None,
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Environment passed to the reducer
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Given
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// When
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.action = Some(action);
        self
    }

    /// Then, for the reduced state
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Then, for the returned effects
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Reduce once and run every assertion
    ///
    /// # Panics
    ///
    /// Panics if the state, action or environment was not set, or if an
    /// assertion fails.
    #[allow(clippy::expect_used)] // Test harness
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");
        let action = self.action.expect("Action must be set with when_action()");
        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        let effects = self.reducer.reduce(&mut state, action, &env);

        for assertion in self.state_assertions {
            assertion(&state);
        }
        for assertion in self.effect_assertions {
            assertion(&effects);
        }
    }
}

/// Effect assertions
pub mod assertions {
    use composable_fetch_core::effect::Effect;

    /// Assert the reducer asked for no work
    ///
    /// # Panics
    ///
    /// Panics if any effect other than `Effect::None` is present.
    pub fn assert_no_effects<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(Effect::is_none),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use composable_fetch_core::{smallvec, SmallVec};

    #[derive(Clone, Debug, PartialEq)]
    enum Phase {
        Waiting,
        Running,
    }

    #[derive(Clone, Debug)]
    enum PhaseAction {
        Start,
        Reset,
    }

    struct PhaseReducer;

    impl Reducer for PhaseReducer {
        type State = Phase;
        type Action = PhaseAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                PhaseAction::Start => {
                    *state = Phase::Running;
                    smallvec![Effect::Future(Box::pin(async { Some(PhaseAction::Reset) }))]
                },
                PhaseAction::Reset => {
                    *state = Phase::Waiting;
                    smallvec![Effect::None]
                },
            }
        }
    }

    #[test]
    #[should_panic(expected = "Expected no effects")]
    fn test_scheduled_work_fails_no_effects() {
        ReducerTest::new(PhaseReducer)
            .with_env(())
            .given_state(Phase::Waiting)
            .when_action(PhaseAction::Start)
            .then_state(|state| assert_eq!(*state, Phase::Running))
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[test]
    fn test_reset_is_pure() {
        ReducerTest::new(PhaseReducer)
            .with_env(())
            .given_state(Phase::Running)
            .when_action(PhaseAction::Reset)
            .then_state(|state| assert_eq!(*state, Phase::Waiting))
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[test]
    fn test_no_effects_accepts_empty_and_none() {
        assertions::assert_no_effects::<PhaseAction>(&[]);
        assertions::assert_no_effects::<PhaseAction>(&[Effect::None, Effect::None]);
    }

    #[test]
    #[should_panic(expected = "Initial state must be set")]
    fn test_missing_state_panics() {
        ReducerTest::new(PhaseReducer)
            .with_env(())
            .when_action(PhaseAction::Start)
            .run();
    }
}
