//! Structured results of test and benchmark contexts.
//!
//! Every [`T`](crate::T) or [`B`](crate::B) produces a [`Report`] once it
//! finishes. Reports nest the same way named cases do, so the report of a
//! root context is the full tree of everything that ran under it.

use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub(crate) fn now_millis() -> u64 {
    let since_epoch = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    u64::try_from(since_epoch.as_millis()).unwrap_or(u64::MAX)
}

/// Identifies one context execution; also names its JSON report file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur while exporting a report.
#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    /// The report could not be encoded as JSON.
    #[error("Report encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// The report file could not be written.
    #[error("Report write failed for {path}: {source}")]
    Write {
        /// Destination that failed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

// ============================================================================
// Report Types
// ============================================================================

/// Which context variant produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportKind {
    /// A synchronous test context.
    Test,
    /// A benchmark context.
    Bench,
}

/// A single reported failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    /// Failure message as reported by the assertion.
    pub message: String,
    /// Source file the failure is attributed to.
    pub file: String,
    /// Source line the failure is attributed to.
    pub line: u32,
    /// Whether the failure halted its context.
    pub fatal: bool,
}

/// Timing recorded by [`B::iter`](crate::B::iter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchStats {
    /// Number of times the measured closure ran.
    pub iterations: u64,
    /// Total wall time across all iterations.
    pub total_ns: u64,
    /// Average wall time per iteration.
    pub ns_per_iter: u64,
}

impl BenchStats {
    /// Build stats from an iteration count and total elapsed nanoseconds.
    pub fn new(iterations: u64, total_ns: u64) -> Self {
        Self {
            iterations,
            total_ns,
            ns_per_iter: total_ns.checked_div(iterations).unwrap_or(0),
        }
    }
}

/// The outcome of one context and all of its named children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Identifier of this execution.
    pub id: RunId,
    /// Full slash-separated name, e.g. `root/group/leaf`.
    pub name: String,
    /// Context variant that produced the report.
    pub kind: ReportKind,
    /// Whether this context and every child passed.
    pub passed: bool,
    /// Failures reported directly on this context.
    pub failures: Vec<Failure>,
    /// Notes recorded through `TB::log`.
    pub logs: Vec<String>,
    /// Reports of named children, in execution order.
    pub children: Vec<Report>,
    /// When the context started (Unix millis).
    pub started_at: u64,
    /// Wall time spent in the context.
    pub elapsed_ms: u64,
    /// Benchmark timing, if `B::iter` was called.
    pub bench: Option<BenchStats>,
}

impl Report {
    /// Find this report or a descendant by its full name.
    pub fn find(&self, name: &str) -> Option<&Report> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    /// Number of failures reported anywhere in this subtree.
    pub fn failure_count(&self) -> usize {
        self.failures.len()
            + self
                .children
                .iter()
                .map(Report::failure_count)
                .sum::<usize>()
    }

    /// All failures in this subtree, depth first.
    pub fn all_failures(&self) -> Vec<&Failure> {
        let mut out: Vec<&Failure> = self.failures.iter().collect();
        for child in &self.children {
            out.extend(child.all_failures());
        }
        out
    }

    /// Render the report as an indented `--- PASS` / `--- FAIL` tree.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        let indent = "    ".repeat(depth);
        let status = if self.passed { "PASS" } else { "FAIL" };
        let _ = writeln!(
            out,
            "{indent}--- {status}: {} ({:.2}s)",
            self.name,
            self.elapsed_ms as f64 / 1000.0
        );
        for line in &self.logs {
            let _ = writeln!(out, "{indent}    {line}");
        }
        for failure in &self.failures {
            let _ = writeln!(
                out,
                "{indent}    {}:{}: {}",
                failure.file,
                failure.line,
                failure.message.trim_start_matches('\n').replace('\n', &format!("\n{indent}        "))
            );
        }
        if let Some(stats) = &self.bench {
            let _ = writeln!(
                out,
                "{indent}    {} iterations, {} ns/iter",
                stats.iterations, stats.ns_per_iter
            );
        }
        for child in &self.children {
            child.render_into(out, depth + 1);
        }
    }

    /// Panic with the rendered report unless the whole tree passed.
    #[track_caller]
    pub fn assert_passed(&self) {
        if !self.passed {
            panic!("{}", self.render());
        }
    }

    /// Encode the report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as JSON to `path`.
    pub fn write_json(&self, path: &Path) -> Result<(), ReportError> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|source| ReportError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the report as `<dir>/<id>.json`, creating `dir` if needed.
    pub fn write_json_in(&self, dir: &Path) -> Result<PathBuf, ReportError> {
        std::fs::create_dir_all(dir).map_err(|source| ReportError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = dir.join(format!("{}.json", self.id));
        self.write_json(&path)?;
        Ok(path)
    }
}
