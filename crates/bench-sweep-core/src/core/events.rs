// crates/bench-sweep-core/src/core/events.rs
// ============================================================================
// Module: Sweep Events
// Description: Notification events and their plain-text rendering.
// Purpose: Give notifiers a single, testable message format.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! The driver emits one [`SweepEvent::RunFinished`] per run and exactly one
//! [`SweepEvent::SweepComplete`] at the end, even when every run failed.
//! Pass messages are wrapped in a code span; failures carry the error text.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::outcome::RunOutcome;
use crate::core::outcome::SweepSummary;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Event delivered to notifiers.
#[derive(Debug, Clone, Copy)]
pub enum SweepEvent<'a> {
    /// A run finished with the given outcome.
    RunFinished {
        /// Sweep name.
        sweep_name: &'a str,
        /// Outcome of the run.
        outcome: &'a RunOutcome,
    },
    /// The sweep terminated.
    SweepComplete {
        /// Final sweep summary.
        summary: &'a SweepSummary,
    },
}

impl SweepEvent<'_> {
    /// Returns true for events describing a failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        match self {
            Self::RunFinished {
                outcome, ..
            } => !outcome.is_success(),
            Self::SweepComplete {
                summary,
            } => summary.cancelled,
        }
    }
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Renders an event as a plain-text message.
#[must_use]
pub fn render_message(event: &SweepEvent<'_>) -> String {
    match event {
        SweepEvent::RunFinished {
            sweep_name,
            outcome,
        } => {
            let dims = &outcome.dimensions;
            let mapping = dims.mapping.as_ref().map_or("-", |mapping| mapping.as_str());
            let txn = dims.txn.map_or_else(|| "-".to_string(), |txn| txn.to_string());
            let body = format!(
                "Experiment name: {sweep_name}, run = {}, threads = {}, engine-scheme = {mapping}, \
                 txn = {txn}, inno = {}",
                outcome.run_id, dims.threads, dims.cross_engine_pct
            );
            if outcome.is_success() {
                format!("`[PASS] {body}`")
            } else {
                let err = outcome.error.as_deref().unwrap_or(outcome.classification.as_str());
                format!("[FAIL] {body}, kind = {}, err = `{err}`", outcome.classification)
            }
        }
        SweepEvent::SweepComplete {
            summary,
        } => {
            let cancelled = if summary.cancelled { " (cancelled)" } else { "" };
            format!(
                "[DONE] Experiment name: {}: {} passed, {} failed, {} runs{cancelled}",
                summary.sweep_name,
                summary.passed(),
                summary.failed(),
                summary.total()
            )
        }
    }
}
