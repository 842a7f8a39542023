//! The two concrete reporting contexts: [`T`] for tests and [`B`] for
//! benchmarks.
//!
//! Both keep their own failures, notes and named children, and both finish
//! into a [`Report`]. A fatal failure halts a context by unwinding with a
//! [`Halt`] naming that context; the `run` (or root entry point) that owns it
//! absorbs the unwind and lets siblings continue. Halts owned by an enclosing
//! context pass through to their owner, and any other panic is re-raised
//! untouched.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe, Location};
use std::time::Instant;

use parking_lot::Mutex;

use crate::action::{Runner, TB};
use crate::config::HarnessConfig;
use crate::report::{now_millis, BenchStats, Failure, Report, ReportKind, RunId};

/// Unwind payload used by [`TB::fatal`] to halt the current context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Halt {
    /// The context being halted.
    pub owner: RunId,
}

#[cfg(feature = "tracing")]
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}

// ============================================================================
// Scope (shared by T and B)
// ============================================================================

struct ScopeState {
    failed: bool,
    failures: Vec<Failure>,
    logs: Vec<String>,
    children: Vec<Report>,
    /// Child names handed out, mapped to the next `#NN` suffix to try.
    seen: HashMap<String, usize>,
    /// Location failures are attributed to.
    caller: &'static Location<'static>,
    bench: Option<BenchStats>,
}

struct Scope {
    id: RunId,
    name: String,
    kind: ReportKind,
    started_at: u64,
    started: Instant,
    state: Mutex<ScopeState>,
}

impl Scope {
    fn new(name: String, kind: ReportKind, origin: &'static Location<'static>) -> Self {
        Self {
            id: RunId::new(),
            name,
            kind,
            started_at: now_millis(),
            started: Instant::now(),
            state: Mutex::new(ScopeState {
                failed: false,
                failures: Vec::new(),
                logs: Vec::new(),
                children: Vec::new(),
                seen: HashMap::new(),
                caller: origin,
                bench: None,
            }),
        }
    }

    fn child(&self, name: &str, kind: ReportKind) -> Self {
        let mut state = self.state.lock();
        let base = format!("{}/{}", self.name, sanitize(name));
        let unique = unique_name(&mut state.seen, base, name.is_empty());
        let origin = state.caller;
        drop(state);

        Self::new(unique, kind, origin)
    }

    fn halt(&self, message: String) -> ! {
        self.report(message, true);
        panic::resume_unwind(Box::new(Halt { owner: self.id }))
    }

    fn helper(&self, caller: &'static Location<'static>) {
        self.state.lock().caller = caller;
    }

    fn log(&self, message: &str) {
        #[cfg(feature = "tracing")]
        tracing::info!(context = %self.name, message, "case.log");

        self.state.lock().logs.push(message.to_string());
    }

    fn report(&self, message: String, fatal: bool) {
        let mut state = self.state.lock();
        let caller = state.caller;

        #[cfg(feature = "tracing")]
        tracing::warn!(
            context = %self.name,
            file = caller.file(),
            line = caller.line(),
            fatal,
            "case.failure"
        );

        state.failed = true;
        state.failures.push(Failure {
            message,
            file: caller.file().to_string(),
            line: caller.line(),
            fatal,
        });
    }

    fn failed(&self) -> bool {
        self.state.lock().failed
    }

    fn adopt(&self, child: Report) {
        let mut state = self.state.lock();
        if !child.passed {
            state.failed = true;
        }
        state.children.push(child);
    }

    fn finish(self) -> Report {
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        let state = self.state.into_inner();
        Report {
            id: self.id,
            name: self.name,
            kind: self.kind,
            passed: !state.failed,
            failures: state.failures,
            logs: state.logs,
            children: state.children,
            started_at: self.started_at,
            elapsed_ms,
            bench: state.bench,
        }
    }
}

/// Pick the first free name starting at `name`, appending `#NN` until
/// nothing handed out before matches. An empty subname always gets a suffix.
fn unique_name(
    seen: &mut HashMap<String, usize>,
    mut name: String,
    mut empty: bool,
) -> String {
    loop {
        let next = seen.get(&name).copied();
        if !empty && next.is_none() {
            seen.insert(name.clone(), 1);
            return name;
        }
        let next = next.unwrap_or(0);
        seen.insert(name.clone(), next + 1);
        name = format!("{name}#{next:02}");
        empty = false;
    }
}

/// Whitespace becomes `_`; other unprintable characters are escaped.
fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_whitespace() {
            out.push('_');
        } else if c.is_control() {
            out.extend(c.escape_default());
        } else {
            out.push(c);
        }
    }
    out
}

/// Run `f` against `ctx`, absorbing a [`Halt`] owned by `owner`.
///
/// Anything else that unwinds out of `f` is handed back for the caller to
/// re-raise once it has recorded what it needs.
fn run_body<C>(
    ctx: &C,
    owner: RunId,
    f: impl FnOnce(&C),
) -> Result<(), Box<dyn Any + Send>> {
    let payload = match panic::catch_unwind(AssertUnwindSafe(|| f(ctx))) {
        Ok(()) => return Ok(()),
        Err(payload) => payload,
    };

    match payload.downcast_ref::<Halt>().map(|halt| halt.owner) {
        Some(halted) if halted == owner => Ok(()),
        Some(_halted) => {
            #[cfg(feature = "tracing")]
            tracing::debug!(owner = %_halted, "case.halt.forward");

            Err(payload)
        }
        None => {
            #[cfg(feature = "tracing")]
            tracing::error!(message = panic_message(&*payload), "case.panic");

            Err(payload)
        }
    }
}

fn run_child<C>(
    parent: &Scope,
    owner: RunId,
    child: C,
    f: impl FnOnce(&C),
    scope: impl FnOnce(C) -> Scope,
) -> bool {
    #[cfg(feature = "tracing")]
    tracing::info!(parent = %parent.name, "case.start");

    let outcome = run_body(&child, owner, f);
    let report = scope(child).finish();
    let passed = report.passed;

    #[cfg(feature = "tracing")]
    tracing::info!(
        case = %report.name,
        passed,
        elapsed_ms = report.elapsed_ms,
        "case.end"
    );

    parent.adopt(report);
    if let Err(payload) = outcome {
        panic::resume_unwind(payload);
    }
    passed
}

#[track_caller]
fn finish_root(config: &HarnessConfig, report: &Report) {
    if let Some(dir) = &config.report_dir {
        if let Err(err) = report.write_json_in(dir) {
            panic!("casework: {err}");
        }
    }
    report.assert_passed();
}

#[track_caller]
fn config_from_env() -> HarnessConfig {
    match HarnessConfig::from_env() {
        Ok(config) => config,
        Err(err) => panic!("invalid casework configuration: {err}"),
    }
}

// ============================================================================
// Test Context
// ============================================================================

/// A synchronous test context.
pub struct T {
    scope: Scope,
}

impl T {
    /// Run `f` against a new root test context and return its report.
    ///
    /// Failures never panic here; inspect the returned report instead.
    #[track_caller]
    pub fn capture(name: &str, f: impl FnOnce(&T)) -> Report {
        let root = T {
            scope: Scope::new(sanitize(name), ReportKind::Test, Location::caller()),
        };
        if let Err(payload) = run_body(&root, root.scope.id, f) {
            panic::resume_unwind(payload);
        }
        root.scope.finish()
    }

    /// Run `f` as a libtest test, configured from the environment.
    ///
    /// Panics with the rendered report if anything failed.
    #[track_caller]
    pub fn test(name: &str, f: impl FnOnce(&T)) {
        Self::test_with(&config_from_env(), name, f)
    }

    /// Like [`T::test`] with an explicit configuration.
    #[track_caller]
    pub fn test_with(config: &HarnessConfig, name: &str, f: impl FnOnce(&T)) {
        let report = Self::capture(name, f);
        finish_root(config, &report);
    }

    /// Run `f` in a child test context named `name`.
    ///
    /// Returns whether the child passed. A failing child marks this context
    /// failed as well.
    pub fn run(&self, name: &str, f: impl FnOnce(&T)) -> bool {
        let child = T {
            scope: self.scope.child(name, ReportKind::Test),
        };
        run_child(&self.scope, child.scope.id, child, f, |child| child.scope)
    }
}

impl fmt::Debug for T {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("T").field("name", &self.scope.name).finish()
    }
}

impl TB for T {
    fn name(&self) -> &str {
        &self.scope.name
    }

    fn helper(&self, caller: &'static Location<'static>) {
        self.scope.helper(caller);
    }

    fn log(&self, message: &str) {
        self.scope.log(message);
    }

    fn error(&self, message: String) {
        self.scope.report(message, false);
    }

    fn fatal(&self, message: String) -> ! {
        self.scope.halt(message)
    }

    fn failed(&self) -> bool {
        self.scope.failed()
    }

    fn runner(&self) -> Runner<'_> {
        Runner::Test(self)
    }
}

// ============================================================================
// Benchmark Context
// ============================================================================

/// A benchmark context.
///
/// Behaves like [`T`] for reporting, and additionally times closures passed
/// to [`B::iter`].
pub struct B {
    scope: Scope,
    iterations: u64,
}

impl B {
    /// Run `f` against a new root benchmark context and return its report.
    #[track_caller]
    pub fn capture(name: &str, config: &HarnessConfig, f: impl FnOnce(&B)) -> Report {
        let root = B {
            scope: Scope::new(sanitize(name), ReportKind::Bench, Location::caller()),
            iterations: config.bench_iterations.max(1),
        };
        if let Err(payload) = run_body(&root, root.scope.id, f) {
            panic::resume_unwind(payload);
        }
        root.scope.finish()
    }

    /// Run `f` as a benchmark from a libtest test, configured from the
    /// environment.
    #[track_caller]
    pub fn bench(name: &str, f: impl FnOnce(&B)) {
        Self::bench_with(&config_from_env(), name, f)
    }

    /// Like [`B::bench`] with an explicit configuration.
    #[track_caller]
    pub fn bench_with(config: &HarnessConfig, name: &str, f: impl FnOnce(&B)) {
        let report = Self::capture(name, config, f);
        finish_root(config, &report);
    }

    /// Run `f` in a child benchmark context named `name`.
    pub fn run(&self, name: &str, f: impl FnOnce(&B)) -> bool {
        let child = B {
            scope: self.scope.child(name, ReportKind::Bench),
            iterations: self.iterations,
        };
        run_child(&self.scope, child.scope.id, child, f, |child| child.scope)
    }

    /// Number of iterations [`B::iter`] performs.
    pub fn n(&self) -> u64 {
        self.iterations
    }

    /// Time `n()` calls of `f` and record the result on this context.
    pub fn iter<R>(&self, mut f: impl FnMut() -> R) {
        let start = Instant::now();
        for _ in 0..self.iterations {
            std::hint::black_box(f());
        }
        let total_ns = u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX);
        let stats = BenchStats::new(self.iterations, total_ns);

        #[cfg(feature = "tracing")]
        tracing::info!(
            context = %self.scope.name,
            iterations = stats.iterations,
            ns_per_iter = stats.ns_per_iter,
            "bench.iter"
        );

        self.scope.state.lock().bench = Some(stats);
    }
}

impl fmt::Debug for B {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("B")
            .field("name", &self.scope.name)
            .field("iterations", &self.iterations)
            .finish()
    }
}

impl TB for B {
    fn name(&self) -> &str {
        &self.scope.name
    }

    fn helper(&self, caller: &'static Location<'static>) {
        self.scope.helper(caller);
    }

    fn log(&self, message: &str) {
        self.scope.log(message);
    }

    fn error(&self, message: String) {
        self.scope.report(message, false);
    }

    fn fatal(&self, message: String) -> ! {
        self.scope.halt(message)
    }

    fn failed(&self) -> bool {
        self.scope.failed()
    }

    fn runner(&self) -> Runner<'_> {
        Runner::Bench(self)
    }
}
