//! Primitive assertions.
//!
//! Each constructor records where it was called and returns an [`F`] that
//! marks that location as the helper frame before checking anything. Failed
//! checks are reported with [`TB::error`] so later checks still run; only
//! [`panics`] reports fatally.

use std::fmt;
use std::panic::{self, AssertUnwindSafe, Location};

use crate::action::{F, TB};

fn leaf(caller: &'static Location<'static>, check: impl Fn(&dyn TB) + 'static) -> F {
    F::new(move |tb| {
        tb.helper(caller);
        check(tb);
    })
}

fn fail(tb: &dyn TB, message: String) {
    #[cfg(feature = "tracing")]
    tracing::debug!(context = tb.name(), %message, "assert.fail");

    tb.error(message);
}

/// Expect `cond` to be true.
#[track_caller]
pub fn is_true(cond: bool) -> F {
    leaf(Location::caller(), move |tb| {
        if !cond {
            fail(tb, "expected true".into());
        }
    })
}

/// Expect `cond` to be false.
#[track_caller]
pub fn is_false(cond: bool) -> F {
    leaf(Location::caller(), move |tb| {
        if cond {
            fail(tb, "expected false".into());
        }
    })
}

/// Expect `result` to be `Ok`.
///
/// The error is rendered when the action is built, so `result` is only
/// borrowed.
#[track_caller]
pub fn no_error<T, E: fmt::Display>(result: &Result<T, E>) -> F {
    let err = result.as_ref().err().map(ToString::to_string);
    leaf(Location::caller(), move |tb| {
        if let Some(err) = &err {
            fail(tb, format!("unexpected error: {err}"));
        }
    })
}

/// Expect `result` to be `Err`.
#[track_caller]
pub fn is_error<T, E>(result: &Result<T, E>) -> F {
    let is_err = result.is_err();
    leaf(Location::caller(), move |tb| {
        if !is_err {
            fail(tb, "expected error".into());
        }
    })
}

/// Expect `actual` to be structurally equal to `expected`.
///
/// Equality is `PartialEq`, which compares contents all the way down
/// through collections, boxes and reference-counted pointers. Like
/// [`no_error`], the comparison happens when the action is built, so both
/// sides may be borrowed.
#[track_caller]
pub fn equal<A, E>(actual: A, expected: E) -> F
where
    A: PartialEq<E> + fmt::Debug,
    E: fmt::Debug,
{
    let mismatch = (actual != expected)
        .then(|| format!("\nexpected: {expected:#?}\n  actual: {actual:#?}"));
    leaf(Location::caller(), move |tb| {
        if let Some(message) = &mismatch {
            fail(tb, message.clone());
        }
    })
}

/// Expect `actual` to differ from `other`.
#[track_caller]
pub fn not_equal<A, E>(actual: A, other: E) -> F
where
    A: PartialEq<E> + fmt::Debug,
    E: fmt::Debug,
{
    let same = (actual == other).then(|| format!("\nunexpected equal value: {actual:#?}"));
    leaf(Location::caller(), move |tb| {
        if let Some(message) = &same {
            fail(tb, message.clone());
        }
    })
}

/// Expect calling `f` to panic.
///
/// The panic is caught and dropped; it never escapes the action. Returning
/// normally is a fatal failure.
#[track_caller]
pub fn panics(f: impl Fn() + 'static) -> F {
    leaf(Location::caller(), move |tb| {
        match panic::catch_unwind(AssertUnwindSafe(&f)) {
            Ok(()) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(context = tb.name(), "assert.fail");

                tb.fatal("expected panic".into())
            }
            Err(_payload) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    context = tb.name(),
                    message = crate::harness::panic_message(&*_payload),
                    "panics.absorbed"
                );
            }
        }
    })
}
