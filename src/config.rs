//! Harness configuration.
//!
//! Root entry points ([`T::test`](crate::T::test), [`B::bench`](crate::B::bench))
//! read their configuration from the environment:
//!
//! - `CASEWORK_BENCH_ITERATIONS`: iterations per `B::iter` call (default 1)
//! - `CASEWORK_REPORT_DIR`: directory receiving one JSON report per root run

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Environment variable holding the benchmark iteration count.
pub const BENCH_ITERATIONS_VAR: &str = "CASEWORK_BENCH_ITERATIONS";

/// Environment variable holding the report output directory.
pub const REPORT_DIR_VAR: &str = "CASEWORK_REPORT_DIR";

/// Errors produced while reading configuration.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A numeric setting could not be parsed.
    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber {
        /// Offending variable.
        var: &'static str,
        /// Raw value found.
        value: String,
    },
}

/// Settings shared by test and benchmark root contexts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// How many times `B::iter` runs its closure. Never zero.
    pub bench_iterations: u64,
    /// Where root contexts write their JSON report, if anywhere.
    pub report_dir: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl HarnessConfig {
    /// One benchmark iteration, no report output.
    pub const fn new() -> Self {
        Self {
            bench_iterations: 1,
            report_dir: None,
        }
    }

    /// Set the benchmark iteration count. Zero is raised to one.
    pub fn with_bench_iterations(mut self, iterations: u64) -> Self {
        self.bench_iterations = iterations.max(1);
        self
    }

    /// Set the report output directory.
    pub fn with_report_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.report_dir = Some(dir.into());
        self
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::new();

        if let Some(raw) = lookup(BENCH_ITERATIONS_VAR) {
            let iterations = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError::InvalidNumber {
                    var: BENCH_ITERATIONS_VAR,
                    value: raw.clone(),
                })?;
            config.bench_iterations = iterations;
        }

        if let Some(dir) = lookup(REPORT_DIR_VAR).filter(|d| !d.trim().is_empty()) {
            config.report_dir = Some(PathBuf::from(dir));
        }

        Ok(config)
    }
}
