//! The action type, the reporting context contract, and the combinators that
//! compose actions.
//!
//! An [`F`] is a unit of test logic applied to a reporting context ([`TB`]).
//! Actions are built bottom-up from primitives, grouped with [`all`], scoped
//! under a name with [`case`], and run with [`apply`].

use std::fmt;
use std::panic::Location;
use std::rc::Rc;

use crate::harness::{B, T};

// ============================================================================
// Reporting Context
// ============================================================================

/// The capability a reporting context exposes to actions.
///
/// [`T`] and [`B`] are the two variants the crate provides. Other
/// implementations are accepted by the primitives, but [`case`] refuses them
/// because it needs a context that can create named children.
pub trait TB {
    /// Full slash-separated name of this context.
    fn name(&self) -> &str;

    /// Mark `caller` as the frame that subsequent failures are attributed to.
    fn helper(&self, caller: &'static Location<'static>);

    /// Record a note on the context.
    fn log(&self, message: &str);

    /// Report a failure and keep running.
    fn error(&self, message: String);

    /// Report a failure and halt the context.
    fn fatal(&self, message: String) -> !;

    /// Whether any failure was reported on this context or its children.
    fn failed(&self) -> bool;

    /// Which concrete variant this context is.
    fn runner(&self) -> Runner<'_> {
        Runner::Unsupported(std::any::type_name::<Self>())
    }
}

/// Capability view used by [`case`] to pick the right child-run entry point.
#[derive(Debug, Clone, Copy)]
pub enum Runner<'a> {
    /// A synchronous test context.
    Test(&'a T),
    /// A benchmark context.
    Bench(&'a B),
    /// Any other context, carrying its type name for diagnostics.
    Unsupported(&'static str),
}

/// Integration errors raised when a context breaks the dispatch contract.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// `case` was applied to a context that is neither `T` nor `B`.
    #[error("{type_name} is not casework::T nor casework::B")]
    UnsupportedContext {
        /// Concrete type of the offending context.
        type_name: &'static str,
    },
}

// ============================================================================
// Action Type
// ============================================================================

/// A composable unit of test logic.
///
/// Cloning is cheap; clones share the same closure.
#[derive(Clone)]
pub struct F(Rc<dyn Fn(&dyn TB)>);

impl F {
    /// Wrap a closure as an action.
    ///
    /// The closure should call [`TB::helper`] before reporting anything so
    /// failures point at the caller.
    pub fn new(f: impl Fn(&dyn TB) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Run the action against `tb`.
    pub fn call(&self, tb: &dyn TB) {
        (self.0)(tb)
    }
}

impl fmt::Debug for F {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("F(..)")
    }
}

// ============================================================================
// Combinators
// ============================================================================

/// Apply `actions` to `tb` in order.
///
/// A fatal report halts `tb`, so actions after it are not reached.
#[track_caller]
pub fn apply(tb: &dyn TB, actions: &[F]) {
    apply_at(tb, Location::caller(), actions)
}

pub(crate) fn apply_at(tb: &dyn TB, caller: &'static Location<'static>, actions: &[F]) {
    tb.helper(caller);
    for action in actions {
        action.call(tb);
    }
}

/// Combine `actions` into one action that applies them in order.
#[track_caller]
pub fn all(actions: impl IntoIterator<Item = F>) -> F {
    let caller = Location::caller();
    let actions: Rc<[F]> = actions.into_iter().collect();
    F::new(move |tb| apply_at(tb, caller, &actions))
}

/// Create an action that runs `actions` inside a child context named `name`.
///
/// # Panics
///
/// Applying the returned action to a context whose [`TB::runner`] is
/// [`Runner::Unsupported`] panics with [`DispatchError::UnsupportedContext`].
/// The harness never turns this panic into a reported failure.
#[track_caller]
pub fn case(name: impl Into<String>, actions: impl IntoIterator<Item = F>) -> F {
    let caller = Location::caller();
    let name = name.into();
    let actions: Rc<[F]> = actions.into_iter().collect();
    F::new(move |tb| {
        tb.helper(caller);
        match tb.runner() {
            Runner::Test(t) => {
                t.run(&name, |child| {
                    child.helper(caller);
                    apply_at(child, caller, &actions);
                });
            }
            Runner::Bench(b) => {
                b.run(&name, |child| {
                    child.helper(caller);
                    apply_at(child, caller, &actions);
                });
            }
            Runner::Unsupported(type_name) => {
                #[cfg(feature = "tracing")]
                tracing::error!(case = %name, context = type_name, "case.unsupported");

                panic!("{}", DispatchError::UnsupportedContext { type_name })
            }
        }
    })
}

/// The action that does nothing.
#[track_caller]
pub fn nop() -> F {
    let caller = Location::caller();
    F::new(move |tb| tb.helper(caller))
}

/// Run `f` now, for its side effects, and return [`nop`].
///
/// Lets setup code sit inline in a list of actions.
#[track_caller]
pub fn eval(f: impl FnOnce()) -> F {
    f();
    nop()
}
