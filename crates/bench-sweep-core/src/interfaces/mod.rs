// crates/bench-sweep-core/src/interfaces/mod.rs
// ============================================================================
// Module: Bench Sweep Interfaces
// Description: Capability traits for processes, readiness, notification, logs.
// Purpose: Define the seams between the sweep runtime and the host.
// Dependencies: crate::core, serde, thiserror
// ============================================================================

//! ## Overview
//! The runtime reaches the host only through these traits, so tests can
//! substitute recording stubs. Ordinary command failure is not an error:
//! a non-zero exit is reported as [`CommandStatus::Failed`], and
//! [`ProcessError`] is reserved for faults such as a binary that cannot be
//! spawned. Notification and logging are infallible by contract.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::description::TableLayout;
use crate::core::events::SweepEvent;
use crate::core::identifiers::EngineMapping;
use crate::core::identifiers::EngineVariant;

// ============================================================================
// SECTION: Process Control
// ============================================================================

/// Exit status of an external lifecycle step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandStatus {
    /// Step exited with status zero.
    Success,
    /// Step exited non-zero or was terminated.
    Failed {
        /// Exit code when the process exited normally.
        code: Option<i32>,
        /// Human-readable description of the failure.
        detail: String,
    },
}

impl CommandStatus {
    /// Classifies a process exit status for `step`.
    #[must_use]
    pub fn from_exit(status: ExitStatus, step: &str) -> Self {
        match status.code() {
            Some(0) => Self::Success,
            Some(code) => Self::Failed {
                code: Some(code),
                detail: format!("{step} exited with code {code}"),
            },
            None => Self::Failed {
                code: None,
                detail: format!("{step} terminated by signal"),
            },
        }
    }

    /// Builds a failure without an exit code.
    #[must_use]
    pub fn failed(detail: impl Into<String>) -> Self {
        Self::Failed {
            code: None,
            detail: detail.into(),
        }
    }

    /// Returns true on success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Failed {
                detail, ..
            } => f.write_str(detail),
        }
    }
}

/// Captured result of one benchmark driver invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverOutput {
    /// Exit status of the driver.
    pub status: CommandStatus,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

/// Faults raised while controlling external processes.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// A program could not be launched.
    #[error("failed to spawn {program}: {message}")]
    Spawn {
        /// Program that failed to launch.
        program: String,
        /// Underlying error text.
        message: String,
    },
    /// I/O failure while waiting on or cleaning up after a process.
    #[error("process io error: {0}")]
    Io(String),
}

/// Inputs for the table preparation step.
#[derive(Debug, Clone, Copy)]
pub struct PrepareRequest<'a> {
    /// Table layout to create.
    pub tables: TableLayout,
    /// Threads used to create tables.
    pub creator_threads: u32,
    /// Engine variant selecting the preparation script.
    pub variant: EngineVariant,
    /// Engine mapping of the run, when it has one.
    pub mapping: Option<&'a EngineMapping>,
}

/// Lifecycle operations against the server and benchmark driver.
pub trait ProcessController {
    /// Terminates every matching server process owned by the current user.
    ///
    /// Succeeds when no process matches.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError`] when the kill command cannot be launched.
    fn kill_all(&self) -> Result<CommandStatus, ProcessError>;

    /// Removes the server storage area.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError`] on unexpected faults.
    fn wipe_storage(&self) -> Result<CommandStatus, ProcessError>;

    /// Runs the one-shot storage initialization step.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError`] when the server binary cannot be launched.
    fn initialize_storage(&self) -> Result<CommandStatus, ProcessError>;

    /// Launches the server in the background without waiting for readiness.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError`] when the start script cannot be launched.
    fn start_server(&self, server_args: &[String]) -> Result<CommandStatus, ProcessError>;

    /// Runs the table preparation step.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError`] when the preparation script cannot be launched.
    fn prepare_tables(&self, request: &PrepareRequest<'_>) -> Result<CommandStatus, ProcessError>;

    /// Runs the benchmark driver and captures its output.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError`] when the driver cannot be launched or awaited.
    fn run_driver(&self, argv: &[String]) -> Result<DriverOutput, ProcessError>;
}

impl<T: ProcessController + ?Sized> ProcessController for Arc<T> {
    fn kill_all(&self) -> Result<CommandStatus, ProcessError> {
        (**self).kill_all()
    }

    fn wipe_storage(&self) -> Result<CommandStatus, ProcessError> {
        (**self).wipe_storage()
    }

    fn initialize_storage(&self) -> Result<CommandStatus, ProcessError> {
        (**self).initialize_storage()
    }

    fn start_server(&self, server_args: &[String]) -> Result<CommandStatus, ProcessError> {
        (**self).start_server(server_args)
    }

    fn prepare_tables(&self, request: &PrepareRequest<'_>) -> Result<CommandStatus, ProcessError> {
        (**self).prepare_tables(request)
    }

    fn run_driver(&self, argv: &[String]) -> Result<DriverOutput, ProcessError> {
        (**self).run_driver(argv)
    }
}

// ============================================================================
// SECTION: Readiness
// ============================================================================

/// Readiness wait failures.
#[derive(Debug, Error)]
pub enum ReadinessError {
    /// The file did not appear in time.
    #[error("{} did not appear within {} ms", .path.display(), .waited.as_millis())]
    Timeout {
        /// Awaited path.
        path: PathBuf,
        /// Timeout that elapsed.
        waited: Duration,
    },
    /// The path names an existing directory.
    #[error("{} is a directory, expected a file", .0.display())]
    PathIsDirectory(PathBuf),
    /// The path has no file name or parent directory to watch.
    #[error("{} cannot be watched: no file name", .0.display())]
    InvalidPath(PathBuf),
    /// The sweep was cancelled while waiting.
    #[error("wait for {} was cancelled", .0.display())]
    Cancelled(PathBuf),
    /// The watch could not be registered or broke down.
    #[error("filesystem watch failed: {0}")]
    Watch(String),
}

/// Blocks until a file appears.
pub trait ReadinessWatcher {
    /// Waits for `path` to exist, up to `timeout`.
    ///
    /// Returns immediately when the file already exists.
    ///
    /// # Errors
    ///
    /// Returns [`ReadinessError::PathIsDirectory`] when `path` is a directory
    /// and [`ReadinessError::Timeout`] when the file never appears.
    fn wait_for_file(&self, path: &Path, timeout: Duration) -> Result<(), ReadinessError>;
}

impl<T: ReadinessWatcher + ?Sized> ReadinessWatcher for Box<T> {
    fn wait_for_file(&self, path: &Path, timeout: Duration) -> Result<(), ReadinessError> {
        (**self).wait_for_file(path, timeout)
    }
}

// ============================================================================
// SECTION: Notification
// ============================================================================

/// Best-effort sweep event delivery.
///
/// Implementations absorb every delivery failure; a notifier never aborts
/// the sweep.
pub trait Notifier {
    /// Delivers `event`.
    fn notify(&self, event: &SweepEvent<'_>);
}

impl<T: Notifier + ?Sized> Notifier for Box<T> {
    fn notify(&self, event: &SweepEvent<'_>) {
        (**self).notify(event);
    }
}

impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    fn notify(&self, event: &SweepEvent<'_>) {
        (**self).notify(event);
    }
}

// ============================================================================
// SECTION: Logging
// ============================================================================

/// Log event severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Diagnostic detail (filesystem events, lifecycle transitions).
    Debug,
    /// Normal progress.
    Info,
    /// Operator-visible anomalies such as restart retries.
    Warn,
    /// Run failures.
    Error,
}

impl LogLevel {
    /// Parses a level label.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// Structured sweep log event.
#[derive(Debug, Clone, Serialize)]
pub struct LogEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Severity.
    pub level: LogLevel,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Run identifier when the event belongs to a run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    /// Human-readable message.
    pub message: String,
    /// Additional key/value context.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<&'static str, String>,
}

impl LogEvent {
    /// Creates a new log event with a consistent timestamp.
    #[must_use]
    pub fn new(event: &'static str, level: LogLevel, message: impl Into<String>) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event,
            level,
            timestamp_ms,
            run_id: None,
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Attaches a run identifier.
    #[must_use]
    pub fn for_run(mut self, run_id: impl fmt::Display) -> Self {
        self.run_id = Some(run_id.to_string());
        self
    }

    /// Attaches a context field.
    #[must_use]
    pub fn with(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        self.fields.insert(key, value.to_string());
        self
    }
}

/// Sink for structured sweep log events.
pub trait SweepLog: Send + Sync {
    /// Records an event.
    fn record(&self, event: &LogEvent);
}
