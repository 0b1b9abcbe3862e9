// crates/bench-sweep-core/src/core/outcome.rs
// ============================================================================
// Module: Run Outcomes
// Description: Per-run classification and the sweep-level aggregate.
// Purpose: Record what happened to every run for reporting.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every run ends in exactly one [`RunClassification`]. Failures are data:
//! they are collected into the [`SweepSummary`] and reported, and never abort
//! the sweep.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::RunId;
use crate::core::identifiers::SweepTimestamp;
use crate::core::spec::RunDimensions;
use crate::core::spec::RunSpec;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Exit classification for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunClassification {
    /// Every round completed with a zero exit status.
    Success,
    /// The benchmark driver exited non-zero.
    BenchmarkFailure,
    /// The server never became ready, or restarts were exhausted.
    InitializationFailure,
    /// An unanticipated fault interrupted the run.
    Exception,
}

impl RunClassification {
    /// Returns a stable label for logs and messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::BenchmarkFailure => "benchmark_failure",
            Self::InitializationFailure => "initialization_failure",
            Self::Exception => "exception",
        }
    }
}

impl fmt::Display for RunClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of executing one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Run identifier.
    pub run_id: RunId,
    /// Dimension values of the run.
    pub dimensions: RunDimensions,
    /// Exit classification.
    pub classification: RunClassification,
    /// Captured log file, when one was opened.
    pub log_path: Option<PathBuf>,
    /// Error detail; present only on non-success.
    pub error: Option<String>,
    /// Restart attempts consumed before the run phase.
    pub restart_attempts: u32,
    /// Wall-clock duration.
    pub duration: Duration,
}

impl RunOutcome {
    /// Builds an outcome for `spec`.
    #[must_use]
    pub fn new(
        spec: &RunSpec,
        classification: RunClassification,
        log_path: Option<PathBuf>,
        error: Option<String>,
    ) -> Self {
        Self {
            run_id: spec.run_id.clone(),
            dimensions: spec.dimensions.clone(),
            classification,
            log_path,
            error,
            restart_attempts: 0,
            duration: Duration::ZERO,
        }
    }

    /// Builds an exception outcome carrying a fault description and any
    /// partial run log.
    #[must_use]
    pub fn exception(
        spec: &RunSpec,
        detail: impl Into<String>,
        log_path: Option<PathBuf>,
        duration: Duration,
    ) -> Self {
        Self {
            duration,
            ..Self::new(spec, RunClassification::Exception, log_path, Some(detail.into()))
        }
    }

    /// Returns true when the run succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.classification == RunClassification::Success
    }
}

/// Aggregate result of a sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepSummary {
    /// Sweep name.
    pub sweep_name: String,
    /// Sweep start timestamp shared by every run identifier.
    pub started_at: SweepTimestamp,
    /// Outcomes in invocation order.
    pub outcomes: Vec<RunOutcome>,
    /// True when the operator cancelled the sweep before it finished.
    pub cancelled: bool,
}

impl SweepSummary {
    /// Number of runs attempted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of successful runs.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.is_success()).count()
    }

    /// Number of failed runs of any classification.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }
}
