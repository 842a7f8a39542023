//! Tests for composable test cases.
//!
//! ## Test Organization
//!
//! - `common`: Shared fixtures, a recording context, and logging setup
//! - `primitives`: Leaf assertions (`is_true`, `equal`, `panics`, ...)
//! - `combinators`: `apply`, `all`, `case`, `nop`, `eval` and the macros
//! - `dispatch`: Context variants, benchmarks, root entry points
//! - `properties`: Property tests over the primitives and combinators
//!
//! ## Fixtures
//!
//! All tests use a small "inventory" domain:
//! - `parse_port`: Fallible parser used by `no_error`/`is_error`
//! - `Inventory`: Nested composite value used by `equal`
//! - `Recorder`: A third-party `TB` that logs every call it receives

mod common;
