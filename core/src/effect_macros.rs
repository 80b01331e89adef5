//! Declarative macros for ergonomic effect construction

/// Create an `Effect::Future` from an async block
///
/// The block must evaluate to `Option<Action>`; `None` means the effect
/// completes without feeding an action back into the store.
///
/// # Example
///
/// ```
/// use composable_fetch_core::{async_effect, effect::Effect};
///
/// #[derive(Debug)]
/// enum Action {
///     Loaded(u32),
/// }
///
/// let effect: Effect<Action> = async_effect! {
///     Some(Action::Loaded(7))
/// };
/// assert!(matches!(effect, Effect::Future(_)));
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}
