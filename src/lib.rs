#![deny(missing_docs)]

//! Casework — composable, named, nestable test cases.
//!
//! # Design Goals
//!
//! Casework builds reusable test logic out of small assertion primitives:
//!
//! - **One action type**: every check, group and named case is an [`F`]
//! - **Named nesting**: [`case`] runs actions in a child context with its own outcome
//! - **Two contexts**: the same actions run under a test ([`T`]) or a benchmark ([`B`])
//! - **Caller attribution**: failures point at the line that built the assertion
//!
//! # Core Concepts
//!
//! - [`TB`]: the reporting context contract (`helper`, `error`, `fatal`, ...)
//! - [`F`]: an action, applied with [`apply`] and combined with [`all`]
//! - [`Report`]: the structured outcome of a context and its children
//!
//! ```
//! use casework::{apply, case, equal, is_true, no_error, T};
//!
//! let parsed: Result<u16, std::num::ParseIntError> = "8080".parse();
//! let report = T::capture("ports", |t| {
//!     apply(t, &[
//!         no_error(&parsed),
//!         case("range", [is_true(parsed.clone().unwrap_or(0) > 1024)]),
//!         equal(parsed.clone().ok(), Some(8080)),
//!     ])
//! });
//! assert!(report.passed);
//! assert!(report.find("ports/range").is_some());
//! ```

// Modules
pub mod action;
pub mod assert;
pub mod config;
pub mod harness;
mod macros;
pub mod report;

// Re-exports for convenience
pub use action::{all, apply, case, eval, nop, DispatchError, Runner, F, TB};
pub use assert::{equal, is_error, is_false, is_true, no_error, not_equal, panics};
pub use config::{ConfigError, HarnessConfig};
pub use harness::{Halt, B, T};
pub use report::{BenchStats, Failure, Report, ReportError, ReportKind, RunId};

#[cfg(test)]
mod tests;
