//! Variadic front-ends for the combinators.
//!
//! - `all!`, `case!`, `apply!`: list actions inline instead of building a `Vec`
//! - `casework!`: define libtest `#[test]` functions from action lists

/// Combine actions into one, like [`all`](crate::all).
///
/// ```
/// use casework::{all, is_true, is_false, T};
///
/// let checks = all![is_true(1 < 2), is_false(2 < 1)];
/// assert!(T::capture("doc", |t| checks.call(t)).passed);
/// ```
#[macro_export]
macro_rules! all {
    ($($action:expr),* $(,)?) => {{
        let actions: ::std::vec::Vec<$crate::F> = ::std::vec![$($action),*];
        $crate::all(actions)
    }};
}

/// Scope actions under a named child context, like [`case`](crate::case).
///
/// ```
/// use casework::{apply, case, equal, T};
///
/// let report = T::capture("doc", |t| apply(t, &[case!("sum", equal(1 + 2, 3))]));
/// assert!(report.find("doc/sum").is_some());
/// ```
#[macro_export]
macro_rules! case {
    ($name:expr $(, $action:expr)* $(,)?) => {{
        let actions: ::std::vec::Vec<$crate::F> = ::std::vec![$($action),*];
        $crate::case($name, actions)
    }};
}

/// Apply actions to a context, like [`apply`](crate::apply).
#[macro_export]
macro_rules! apply {
    ($tb:expr $(, $action:expr)* $(,)?) => {
        $crate::apply($tb, &[$($action),*])
    };
}

/// Define `#[test]` functions whose bodies are action lists.
///
/// Each function runs its actions under [`T::test`](crate::T::test), so a
/// failure fails the libtest test with the rendered report.
///
/// ```ignore
/// casework::casework! {
///     arithmetic => [is_true(1 + 1 == 2), equal(2 * 2, 4)],
///     grouped => [case!("signs", is_true(-1 < 0))],
/// }
/// ```
#[macro_export]
macro_rules! casework {
    (
        $(
            $(#[$meta:meta])*
            $name:ident => [ $($action:expr),* $(,)? ]
        ),*
        $(,)?
    ) => {
        $(
            $(#[$meta])*
            #[test]
            fn $name() {
                $crate::T::test(stringify!($name), |t| {
                    $crate::apply!(t $(, $action)*);
                });
            }
        )*
    };
}
