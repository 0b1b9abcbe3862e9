// crates/bench-sweep-core/src/runtime/driver.rs
// ============================================================================
// Module: Sweep Driver
// Description: Sequences runs, converts faults, and reports outcomes.
// Purpose: Drive a whole sweep to completion despite individual run failures.
// Dependencies: crate::{core, interfaces}, serde_json
// ============================================================================

//! ## Overview
//! The driver prepares the sweep log directory, stages configured files, and
//! executes each run spec in expansion order. A run that aborts with a fault
//! is recorded as an exception and the sweep continues. Every run produces
//! exactly one notification, and the sweep ends with one completion
//! notification, also after cancellation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::core::BenchmarkItem;
use crate::core::RunOutcome;
use crate::core::RunSpec;
use crate::core::SweepDescription;
use crate::core::SweepEvent;
use crate::core::SweepSummary;
use crate::core::SweepTimestamp;
use crate::interfaces::LogEvent;
use crate::interfaces::LogLevel;
use crate::interfaces::Notifier;
use crate::interfaces::ProcessController;
use crate::interfaces::ReadinessWatcher;
use crate::interfaces::SweepLog;
use crate::runtime::cancel::CancelFlag;
use crate::runtime::executor::RunExecutor;
use crate::runtime::expander::expand;
use crate::runtime::workspace::SweepError;
use crate::runtime::workspace::prepare_sweep_dir;
use crate::runtime::workspace::stage_files;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// File name of the machine-readable sweep summary.
pub const SUMMARY_FILE_NAME: &str = "summary.json";

// ============================================================================
// SECTION: Driver
// ============================================================================

/// Executes a sweep description run by run.
pub struct SweepDriver<'a, P, W, N> {
    /// Per-run executor.
    executor: RunExecutor<'a, P, W>,
    /// Outcome notifier.
    notifier: N,
    /// Sink for progress events.
    log: Arc<dyn SweepLog>,
    /// Cancellation flag shared with the executor.
    cancel: CancelFlag,
}

impl<'a, P, W, N> SweepDriver<'a, P, W, N>
where
    P: ProcessController,
    W: ReadinessWatcher,
    N: Notifier,
{
    /// Creates a driver around `executor`.
    #[must_use]
    pub fn new(executor: RunExecutor<'a, P, W>, notifier: N, log: Arc<dyn SweepLog>) -> Self {
        Self {
            executor,
            notifier,
            log,
            cancel: CancelFlag::new(),
        }
    }

    /// Replaces the cancellation flag for the driver and its executor.
    #[must_use]
    pub fn with_cancel_flag(self, cancel: CancelFlag) -> Self {
        Self {
            executor: self.executor.with_cancel_flag(cancel.clone()),
            cancel,
            ..self
        }
    }

    /// Runs the sweep with the current time as its start timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError`] when the log directory or staged files cannot be
    /// prepared; no run is started in that case.
    pub fn run(&self, description: &SweepDescription) -> Result<SweepSummary, SweepError> {
        self.run_at(description, SweepTimestamp::now())
    }

    /// Runs the sweep with an explicit start timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError`] when the log directory or staged files cannot be
    /// prepared; no run is started in that case.
    pub fn run_at(
        &self,
        description: &SweepDescription,
        started_at: SweepTimestamp,
    ) -> Result<SweepSummary, SweepError> {
        let environment = &self.executor.config().environment;
        let sweep_dir = prepare_sweep_dir(&environment.log_dir, &description.name, &*self.log)?;
        stage_files(&environment.stage_files, &environment.cwd, &*self.log)?;
        let specs: Vec<RunSpec> = expand(description, started_at).collect();
        let unfiltered: usize = description.items.iter().map(BenchmarkItem::product_len).sum();
        self.log.record(
            &LogEvent::new("sweep_started", LogLevel::Info, "sweep started")
                .with("sweep", &description.name)
                .with("runs", specs.len())
                .with("filtered", unfiltered.saturating_sub(specs.len()))
                .with("log_dir", sweep_dir.display()),
        );

        let mut outcomes = Vec::new();
        for spec in &specs {
            if self.cancel.is_cancelled() {
                break;
            }
            let started = Instant::now();
            let outcome = match self.executor.execute(spec, &sweep_dir) {
                Ok(outcome) => outcome,
                Err(err) => {
                    self.log.record(
                        &LogEvent::new("run_exception", LogLevel::Error, "run aborted by fault")
                            .for_run(&spec.run_id)
                            .with("error", &err),
                    );
                    let log_path = err.log_path().map(Path::to_path_buf);
                    RunOutcome::exception(spec, err.to_string(), log_path, started.elapsed())
                }
            };
            self.notifier.notify(&SweepEvent::RunFinished {
                sweep_name: &description.name,
                outcome: &outcome,
            });
            outcomes.push(outcome);
        }

        let summary = SweepSummary {
            sweep_name: description.name.clone(),
            started_at,
            outcomes,
            cancelled: self.cancel.is_cancelled(),
        };
        self.write_summary(&sweep_dir, &summary);
        self.log.record(
            &LogEvent::new("sweep_finished", LogLevel::Info, "sweep finished")
                .with("sweep", &summary.sweep_name)
                .with("passed", summary.passed())
                .with("failed", summary.failed())
                .with("cancelled", summary.cancelled),
        );
        self.notifier.notify(&SweepEvent::SweepComplete {
            summary: &summary,
        });
        Ok(summary)
    }

    /// Writes `summary.json`; failures are logged.
    fn write_summary(&self, sweep_dir: &Path, summary: &SweepSummary) {
        let path = sweep_dir.join(SUMMARY_FILE_NAME);
        let result = serde_json::to_vec_pretty(summary)
            .map_err(|err| err.to_string())
            .and_then(|bytes| fs::write(&path, bytes).map_err(|err| err.to_string()));
        if let Err(err) = result {
            self.log.record(
                &LogEvent::new("summary_failed", LogLevel::Warn, "cannot write sweep summary")
                    .with("path", path.display())
                    .with("error", err),
            );
        }
    }
}
