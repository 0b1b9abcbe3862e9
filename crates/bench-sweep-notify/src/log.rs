// crates/bench-sweep-notify/src/log.rs
// ============================================================================
// Module: Log Notifier
// Description: Notifier recording outcome messages in the sweep log.
// Purpose: Keep an operator-visible trail when no endpoint is configured.
// Dependencies: bench-sweep-core
// ============================================================================

//! ## Overview
//! Failed runs are recorded at `warn`, everything else at `info`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use bench_sweep_core::LogEvent;
use bench_sweep_core::LogLevel;
use bench_sweep_core::Notifier;
use bench_sweep_core::SweepEvent;
use bench_sweep_core::SweepLog;
use bench_sweep_core::render_message;

// ============================================================================
// SECTION: Notifier
// ============================================================================

/// Notifier writing rendered messages to a [`SweepLog`].
pub struct LogNotifier {
    /// Destination sink.
    log: Arc<dyn SweepLog>,
}

impl LogNotifier {
    /// Creates a notifier writing to `log`.
    #[must_use]
    pub fn new(log: Arc<dyn SweepLog>) -> Self {
        Self {
            log,
        }
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, event: &SweepEvent<'_>) {
        let level = if event.is_failure() { LogLevel::Warn } else { LogLevel::Info };
        let mut record = LogEvent::new("notification", level, render_message(event));
        if let SweepEvent::RunFinished {
            outcome, ..
        } = event
        {
            record = record.for_run(&outcome.run_id);
        }
        self.log.record(&record);
    }
}
