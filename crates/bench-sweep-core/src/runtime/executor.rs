// crates/bench-sweep-core/src/runtime/executor.rs
// ============================================================================
// Module: Run Executor
// Description: Executes one run spec through the full server lifecycle.
// Purpose: Isolate each run behind a clean restart and guaranteed teardown.
// Dependencies: crate::{core, interfaces}, thiserror
// ============================================================================

//! ## Overview
//! Each run starts from a clean server: kill, wipe storage, initialize, and
//! start, retried with capped exponential backoff until a start succeeds,
//! the retry cap is reached, or the sweep is cancelled. Readiness is the
//! appearance of the server socket; a readiness timeout classifies the run as
//! an initialization failure without further retries. After table
//! preparation the driver runs once per round, appending each round's output
//! to the run log. The first failing round ends the run. Teardown always
//! kills the server, whatever the outcome.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::File;
use std::io;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use thiserror::Error;

use crate::core::LifecycleError;
use crate::core::LifecycleTracker;
use crate::core::RunClassification;
use crate::core::RunOutcome;
use crate::core::RunSpec;
use crate::core::ServerLifecycleState;
use crate::core::StaticConfig;
use crate::interfaces::CommandStatus;
use crate::interfaces::LogEvent;
use crate::interfaces::LogLevel;
use crate::interfaces::PrepareRequest;
use crate::interfaces::ProcessController;
use crate::interfaces::ProcessError;
use crate::interfaces::ReadinessError;
use crate::interfaces::ReadinessWatcher;
use crate::interfaces::SweepLog;
use crate::runtime::cancel::CancelFlag;
use crate::runtime::command::CommandBuilder;
use crate::runtime::command::display_command;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum characters of driver stderr quoted in a failure description.
const STDERR_EXCERPT_CHARS: usize = 200;
/// Failure detail for runs cut short by cancellation during bring-up.
const CANCELLED_DETAIL: &str = "sweep cancelled before the server became ready";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Faults that abort a run; the sweep driver records them as exceptions.
#[derive(Debug, Error)]
pub enum RunError {
    /// A lifecycle command could not be launched or awaited.
    #[error(transparent)]
    Process(#[from] ProcessError),
    /// The driver could not be launched or awaited after the run log was
    /// opened; the log keeps the rounds completed so far.
    #[error("{source} (partial log {})", .log_path.display())]
    Driver {
        /// Partial run log.
        log_path: PathBuf,
        /// Underlying process fault.
        source: ProcessError,
    },
    /// The run log could not be written.
    #[error("run log {}: {message}", .path.display())]
    Log {
        /// Log file path.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },
    /// The executor attempted an illegal lifecycle transition.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

impl RunError {
    /// Returns the run log left on disk by the failed run, if any.
    #[must_use]
    pub fn log_path(&self) -> Option<&Path> {
        match self {
            Self::Driver {
                log_path, ..
            } => Some(log_path),
            Self::Log {
                path, ..
            } => Some(path),
            Self::Process(_) | Self::Lifecycle(_) => None,
        }
    }
}

// ============================================================================
// SECTION: Executor
// ============================================================================

/// Executes run specs one at a time.
pub struct RunExecutor<'a, P, W> {
    /// Static configuration.
    config: &'a StaticConfig,
    /// Driver command builder.
    builder: CommandBuilder<'a>,
    /// Host process control.
    controller: P,
    /// Readiness watcher for the server socket.
    watcher: W,
    /// Sink for progress events.
    log: Arc<dyn SweepLog>,
    /// Cancellation flag observed by the restart loop.
    cancel: CancelFlag,
}

/// Result of bringing the server up.
enum BringUp {
    /// Server ready and tables prepared after `attempts` restarts.
    Ready {
        /// Restart attempts used.
        attempts: u32,
    },
    /// Server never became usable.
    Failed {
        /// Restart attempts used.
        attempts: u32,
        /// Failure description.
        detail: String,
    },
}

impl<'a, P, W> RunExecutor<'a, P, W>
where
    P: ProcessController,
    W: ReadinessWatcher,
{
    /// Creates an executor.
    #[must_use]
    pub fn new(config: &'a StaticConfig, controller: P, watcher: W, log: Arc<dyn SweepLog>) -> Self {
        Self {
            config,
            builder: CommandBuilder::new(config),
            controller,
            watcher,
            log,
            cancel: CancelFlag::new(),
        }
    }

    /// Replaces the cancellation flag.
    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns the static configuration.
    #[must_use]
    pub const fn config(&self) -> &'a StaticConfig {
        self.config
    }

    /// Returns the process controller.
    pub const fn controller(&self) -> &P {
        &self.controller
    }

    /// Executes `spec`, writing its run log under `log_dir`.
    ///
    /// Ordinary failures are reported through the outcome classification.
    /// Teardown runs on every path, including errors.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] when a lifecycle command cannot be launched, the
    /// run log cannot be written, or the lifecycle is violated.
    pub fn execute(&self, spec: &RunSpec, log_dir: &Path) -> Result<RunOutcome, RunError> {
        let started = Instant::now();
        self.log.record(
            &LogEvent::new("run_started", LogLevel::Info, "run started")
                .for_run(&spec.run_id)
                .with("index", spec.index)
                .with("threads", spec.dimensions.threads)
                .with("cross_engine_pct", spec.dimensions.cross_engine_pct),
        );
        let mut lifecycle = LifecycleTracker::new();
        let result = self.execute_phases(spec, log_dir, &mut lifecycle);
        self.teardown(spec, &mut lifecycle);

        let mut outcome = result?;
        outcome.duration = started.elapsed();
        let level = if outcome.is_success() { LogLevel::Info } else { LogLevel::Error };
        let mut event = LogEvent::new("run_finished", level, "run finished")
            .for_run(&outcome.run_id)
            .with("classification", outcome.classification)
            .with("restart_attempts", outcome.restart_attempts)
            .with("duration_ms", outcome.duration.as_millis());
        if let Some(error) = &outcome.error {
            event = event.with("error", error);
        }
        self.log.record(&event);
        Ok(outcome)
    }

    /// Runs bring-up and rounds; teardown is the caller's job.
    fn execute_phases(
        &self,
        spec: &RunSpec,
        log_dir: &Path,
        lifecycle: &mut LifecycleTracker,
    ) -> Result<RunOutcome, RunError> {
        match self.bring_up(spec, lifecycle)? {
            BringUp::Failed {
                attempts,
                detail,
            } => {
                let mut outcome = RunOutcome::new(
                    spec,
                    RunClassification::InitializationFailure,
                    None,
                    Some(detail),
                );
                outcome.restart_attempts = attempts;
                Ok(outcome)
            }
            BringUp::Ready {
                attempts,
            } => {
                let mut outcome = self.run_rounds(spec, log_dir, lifecycle)?;
                outcome.restart_attempts = attempts;
                Ok(outcome)
            }
        }
    }

    /// Restarts the server until it is ready with tables prepared.
    fn bring_up(
        &self,
        spec: &RunSpec,
        lifecycle: &mut LifecycleTracker,
    ) -> Result<BringUp, RunError> {
        let policy = &self.config.restart;
        let server = &self.config.server;
        let mut last_failure = String::from("no restart attempted");
        let mut attempt: u32 = 0;
        loop {
            if self.cancel.is_cancelled() {
                return Ok(BringUp::Failed {
                    attempts: attempt,
                    detail: CANCELLED_DETAIL.to_string(),
                });
            }
            if !policy.permits(attempt.saturating_add(1)) {
                return Ok(BringUp::Failed {
                    attempts: attempt,
                    detail: format!("server restart failed after {attempt} attempts: {last_failure}"),
                });
            }
            attempt = attempt.saturating_add(1);

            if let CommandStatus::Failed {
                detail, ..
            } = self.restart(spec, lifecycle)?
            {
                last_failure = detail;
                self.pause_before_retry(spec, attempt, &last_failure);
                continue;
            }

            let socket = &self.config.environment.socket;
            if let Err(err) = self.watcher.wait_for_file(socket, server.readiness_timeout) {
                if matches!(err, ReadinessError::Cancelled(_)) {
                    return Ok(BringUp::Failed {
                        attempts: attempt,
                        detail: CANCELLED_DETAIL.to_string(),
                    });
                }
                self.log.record(
                    &LogEvent::new("readiness_failed", LogLevel::Error, "server never became ready")
                        .for_run(&spec.run_id)
                        .with("error", &err),
                );
                return Ok(BringUp::Failed {
                    attempts: attempt,
                    detail: format!("server readiness: {err}"),
                });
            }
            lifecycle.advance(ServerLifecycleState::Ready)?;
            if !server.post_ready_delay.is_zero() {
                thread::sleep(server.post_ready_delay);
            }

            let request = PrepareRequest {
                tables: spec.tables,
                creator_threads: self.config.prepare.creator_threads,
                variant: self.config.engine_variant(spec.dimensions.mapping.as_ref()),
                mapping: spec.dimensions.mapping.as_ref(),
            };
            if let CommandStatus::Failed {
                detail, ..
            } = self.controller.prepare_tables(&request)?
            {
                last_failure = detail;
                self.pause_before_retry(spec, attempt, &last_failure);
                continue;
            }
            lifecycle.advance(ServerLifecycleState::TablesPrepared)?;
            return Ok(BringUp::Ready {
                attempts: attempt,
            });
        }
    }

    /// Performs one kill, wipe, initialize, and start sequence.
    fn restart(
        &self,
        spec: &RunSpec,
        lifecycle: &mut LifecycleTracker,
    ) -> Result<CommandStatus, RunError> {
        lifecycle.advance(ServerLifecycleState::Killed)?;
        let status = self.controller.kill_all()?;
        if !status.is_success() {
            return Ok(status);
        }
        lifecycle.advance(ServerLifecycleState::Initializing)?;
        let status = self.controller.wipe_storage()?;
        if !status.is_success() {
            return Ok(status);
        }
        let status = self.controller.initialize_storage()?;
        if !status.is_success() {
            return Ok(status);
        }
        lifecycle.advance(ServerLifecycleState::Initialized)?;
        self.clear_stale_socket(spec);
        lifecycle.advance(ServerLifecycleState::Starting)?;
        Ok(self.controller.start_server(&spec.server_args)?)
    }

    /// Removes a socket file left behind by a previous server.
    fn clear_stale_socket(&self, spec: &RunSpec) {
        let socket = &self.config.environment.socket;
        if socket.symlink_metadata().is_ok_and(|meta| !meta.is_dir())
            && let Err(err) = fs::remove_file(socket)
        {
            self.log.record(
                &LogEvent::new("stale_socket", LogLevel::Warn, "cannot remove stale socket")
                    .for_run(&spec.run_id)
                    .with("path", socket.display())
                    .with("error", err),
            );
        }
    }

    /// Logs a retry and sleeps for the policy backoff.
    fn pause_before_retry(&self, spec: &RunSpec, attempt: u32, detail: &str) {
        let backoff = self.config.restart.backoff_after(attempt);
        self.log.record(
            &LogEvent::new("restart_retry", LogLevel::Warn, "server restart attempt failed")
                .for_run(&spec.run_id)
                .with("attempt", attempt)
                .with("backoff_ms", backoff.as_millis())
                .with("error", detail),
        );
        thread::sleep(backoff);
    }

    /// Runs every round, writing the run log.
    fn run_rounds(
        &self,
        spec: &RunSpec,
        log_dir: &Path,
        lifecycle: &mut LifecycleTracker,
    ) -> Result<RunOutcome, RunError> {
        let argv = self.builder.build(spec);
        let log_path = log_dir.join(spec.log_file_name());
        lifecycle.advance(ServerLifecycleState::Running)?;

        let mut run_log = RunLog::create(&log_path)?;
        run_log.line(&format!("Command: {}", display_command(&argv)))?;
        for round in 1..=spec.rounds {
            run_log.line(&format!("= RUN {round} ="))?;
            self.log.record(
                &LogEvent::new("round_started", LogLevel::Debug, "driver round started")
                    .for_run(&spec.run_id)
                    .with("round", round),
            );
            let output = match self.controller.run_driver(&argv) {
                Ok(output) => output,
                Err(source) => {
                    run_log.finish()?;
                    return Err(RunError::Driver {
                        log_path,
                        source,
                    });
                }
            };
            run_log.append(&output.stdout)?;
            if let CommandStatus::Failed {
                detail, ..
            } = &output.status
            {
                run_log.finish()?;
                lifecycle.advance(ServerLifecycleState::Stopped)?;
                let excerpt = stderr_excerpt(&output.stderr);
                let detail = format!("round {round} of {}: {detail}{excerpt}", spec.rounds);
                return Ok(RunOutcome::new(
                    spec,
                    RunClassification::BenchmarkFailure,
                    Some(log_path),
                    Some(detail),
                ));
            }
        }
        run_log.finish()?;
        lifecycle.advance(ServerLifecycleState::Stopped)?;
        Ok(RunOutcome::new(spec, RunClassification::Success, Some(log_path), None))
    }

    /// Kills the server; failures are logged and never change the outcome.
    fn teardown(&self, spec: &RunSpec, lifecycle: &mut LifecycleTracker) {
        let _ = lifecycle.advance(ServerLifecycleState::Killed);
        let detail = match self.controller.kill_all() {
            Ok(CommandStatus::Success) => return,
            Ok(status) => status.to_string(),
            Err(err) => err.to_string(),
        };
        self.log.record(
            &LogEvent::new("teardown_failed", LogLevel::Warn, "server teardown failed")
                .for_run(&spec.run_id)
                .with("error", detail),
        );
    }
}

// ============================================================================
// SECTION: Run Log
// ============================================================================

/// Buffered writer for one run's log file.
struct RunLog {
    /// Log file path.
    path: PathBuf,
    /// Buffered file handle.
    writer: BufWriter<File>,
}

impl RunLog {
    /// Creates (or truncates) the log file.
    fn create(path: &Path) -> Result<Self, RunError> {
        let file = File::create(path).map_err(|err| log_error(path, &err))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    /// Writes one line.
    fn line(&mut self, text: &str) -> Result<(), RunError> {
        writeln!(self.writer, "{text}").map_err(|err| log_error(&self.path, &err))
    }

    /// Appends captured output verbatim, terminating it with a newline.
    fn append(&mut self, text: &str) -> Result<(), RunError> {
        self.writer.write_all(text.as_bytes()).map_err(|err| log_error(&self.path, &err))?;
        if !text.is_empty() && !text.ends_with('\n') {
            self.writer.write_all(b"\n").map_err(|err| log_error(&self.path, &err))?;
        }
        Ok(())
    }

    /// Flushes buffered output to disk.
    fn finish(mut self) -> Result<(), RunError> {
        self.writer.flush().map_err(|err| log_error(&self.path, &err))
    }
}

/// Wraps an I/O failure on the run log.
fn log_error(path: &Path, err: &io::Error) -> RunError {
    RunError::Log {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// Returns the last non-empty stderr line, formatted for a failure detail.
fn stderr_excerpt(stderr: &str) -> String {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| {
            let excerpt: String = line.chars().take(STDERR_EXCERPT_CHARS).collect();
            format!(" ({excerpt})")
        })
        .unwrap_or_default()
}
