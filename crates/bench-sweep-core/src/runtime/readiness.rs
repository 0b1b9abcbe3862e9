// crates/bench-sweep-core/src/runtime/readiness.rs
// ============================================================================
// Module: Readiness Watchers
// Description: Event-driven and polling waits for a file to appear.
// Purpose: Detect server readiness by the appearance of its socket file.
// Dependencies: crate::interfaces, notify
// ============================================================================

//! ## Overview
//! The event watcher registers a non-recursive OS watch on the parent
//! directory and waits for a creation event naming the target. The target is
//! checked again after the watch is registered, so a file created between
//! the first check and registration is still observed. When the platform
//! watch cannot be set up the event watcher falls back to polling. Both
//! watchers observe a [`CancelFlag`] at least every [`CANCEL_CHECK_INTERVAL`]
//! and stop waiting once it is set.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc;
use std::sync::mpsc::RecvTimeoutError;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use notify::Event;
use notify::EventKind;
use notify::RecursiveMode;
use notify::Watcher;

use crate::core::ReadinessMode;
use crate::interfaces::LogEvent;
use crate::interfaces::LogLevel;
use crate::interfaces::ReadinessError;
use crate::interfaces::ReadinessWatcher;
use crate::interfaces::SweepLog;
use crate::runtime::cancel::CancelFlag;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// True on platforms with a native `notify` backend.
const EVENT_WATCH_SUPPORTED: bool =
    cfg!(any(target_os = "linux", target_os = "macos", target_os = "windows"));
/// Longest wait slice between cancellation checks.
pub const CANCEL_CHECK_INTERVAL: Duration = Duration::from_millis(250);

// ============================================================================
// SECTION: Selection
// ============================================================================

/// Builds the watcher for `mode`.
///
/// `Auto` picks the event watcher where the platform supports it. The
/// returned watcher stops waiting once `cancel` is set.
#[must_use]
pub fn select_watcher(
    mode: ReadinessMode,
    poll_interval: Duration,
    cancel: CancelFlag,
    log: Arc<dyn SweepLog>,
) -> Box<dyn ReadinessWatcher + Send + Sync> {
    let event = matches!(mode, ReadinessMode::Event)
        || (matches!(mode, ReadinessMode::Auto) && EVENT_WATCH_SUPPORTED);
    if event {
        Box::new(EventReadinessWatcher::new(poll_interval, log).with_cancel_flag(cancel))
    } else {
        Box::new(PollingReadinessWatcher::new(poll_interval, log).with_cancel_flag(cancel))
    }
}

// ============================================================================
// SECTION: Event Watcher
// ============================================================================

/// Readiness watcher backed by OS filesystem notifications.
pub struct EventReadinessWatcher {
    /// Polling watcher used when the OS watch is unavailable.
    fallback: PollingReadinessWatcher,
    /// Sink for filesystem event diagnostics.
    log: Arc<dyn SweepLog>,
    /// Cancellation flag checked between wait slices.
    cancel: CancelFlag,
}

impl EventReadinessWatcher {
    /// Creates an event watcher; `fallback_interval` drives the polling
    /// fallback.
    #[must_use]
    pub fn new(fallback_interval: Duration, log: Arc<dyn SweepLog>) -> Self {
        Self {
            fallback: PollingReadinessWatcher::new(fallback_interval, Arc::clone(&log)),
            log,
            cancel: CancelFlag::new(),
        }
    }

    /// Replaces the cancellation flag, also for the polling fallback.
    #[must_use]
    pub fn with_cancel_flag(self, cancel: CancelFlag) -> Self {
        Self {
            fallback: self.fallback.with_cancel_flag(cancel.clone()),
            cancel,
            ..self
        }
    }

    /// Falls back to polling after the OS watch failed to set up.
    fn fall_back(
        &self,
        path: &Path,
        timeout: Duration,
        reason: &notify::Error,
    ) -> Result<(), ReadinessError> {
        self.log.record(
            &LogEvent::new("readiness_fallback", LogLevel::Warn, "filesystem watch unavailable")
                .with("path", path.display())
                .with("error", reason),
        );
        self.fallback.wait_for_file(path, timeout)
    }
}

impl ReadinessWatcher for EventReadinessWatcher {
    fn wait_for_file(&self, path: &Path, timeout: Duration) -> Result<(), ReadinessError> {
        if file_present(path)? {
            return Ok(());
        }
        let name = path.file_name().ok_or_else(|| ReadinessError::InvalidPath(path.to_path_buf()))?;
        let parent = path.parent().filter(|parent| !parent.as_os_str().is_empty()).unwrap_or(Path::new("."));

        let (sender, receiver) = mpsc::channel::<notify::Result<Event>>();
        let mut watcher = match notify::recommended_watcher(sender) {
            Ok(watcher) => watcher,
            Err(err) => return self.fall_back(path, timeout, &err),
        };
        if let Err(err) = watcher.watch(parent, RecursiveMode::NonRecursive) {
            return self.fall_back(path, timeout, &err);
        }
        if file_present(path)? {
            return Ok(());
        }

        let deadline = Instant::now() + timeout;
        loop {
            if self.cancel.is_cancelled() {
                return Err(ReadinessError::Cancelled(path.to_path_buf()));
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(timeout_error(path, timeout));
            }
            match receiver.recv_timeout(remaining.min(CANCEL_CHECK_INTERVAL)) {
                Ok(Ok(event)) => {
                    let names_target =
                        event.paths.iter().any(|changed| changed.file_name() == Some(name));
                    self.log.record(
                        &LogEvent::new("readiness_event", LogLevel::Debug, "filesystem event")
                            .with("kind", kind_label(&event.kind))
                            .with("paths", joined_paths(&event.paths))
                            .with("target", names_target),
                    );
                    if names_target
                        && (matches!(event.kind, EventKind::Create(_)) || file_present(path)?)
                    {
                        return Ok(());
                    }
                }
                Ok(Err(err)) => {
                    self.log.record(
                        &LogEvent::new("readiness_event_error", LogLevel::Warn, "watch error")
                            .with("error", err),
                    );
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(ReadinessError::Watch("event channel closed".to_string()));
                }
            }
        }
    }
}

// ============================================================================
// SECTION: Polling Watcher
// ============================================================================

/// Readiness watcher that checks for the file at a fixed interval.
pub struct PollingReadinessWatcher {
    /// Delay between existence checks.
    interval: Duration,
    /// Sink for diagnostics.
    log: Arc<dyn SweepLog>,
    /// Cancellation flag checked on every tick.
    cancel: CancelFlag,
}

impl PollingReadinessWatcher {
    /// Creates a polling watcher.
    #[must_use]
    pub fn new(interval: Duration, log: Arc<dyn SweepLog>) -> Self {
        Self {
            interval,
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
}

impl ReadinessWatcher for PollingReadinessWatcher {
    fn wait_for_file(&self, path: &Path, timeout: Duration) -> Result<(), ReadinessError> {
        let deadline = Instant::now() + timeout;
        let mut checks: u64 = 0;
        loop {
            checks = checks.saturating_add(1);
            if file_present(path)? {
                self.log.record(
                    &LogEvent::new("readiness_poll", LogLevel::Debug, "file observed")
                        .with("path", path.display())
                        .with("checks", checks),
                );
                return Ok(());
            }
            if self.cancel.is_cancelled() {
                return Err(ReadinessError::Cancelled(path.to_path_buf()));
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(timeout_error(path, timeout));
            }
            thread::sleep(self.interval.min(remaining).min(CANCEL_CHECK_INTERVAL));
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns whether `path` exists as a non-directory.
fn file_present(path: &Path) -> Result<bool, ReadinessError> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Err(ReadinessError::PathIsDirectory(path.to_path_buf())),
        Ok(_) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(ReadinessError::Watch(format!("cannot stat {}: {err}", path.display()))),
    }
}

/// Builds the timeout error for `path`.
fn timeout_error(path: &Path, waited: Duration) -> ReadinessError {
    ReadinessError::Timeout {
        path: path.to_path_buf(),
        waited,
    }
}

/// Joins event paths into one log field.
fn joined_paths(paths: &[PathBuf]) -> String {
    paths.iter().map(|path| path.display().to_string()).collect::<Vec<_>>().join(",")
}

/// Returns a stable label for a filesystem event kind.
const fn kind_label(kind: &EventKind) -> &'static str {
    match kind {
        EventKind::Any => "any",
        EventKind::Access(_) => "access",
        EventKind::Create(_) => "create",
        EventKind::Modify(_) => "modify",
        EventKind::Remove(_) => "remove",
        EventKind::Other => "other",
    }
}
