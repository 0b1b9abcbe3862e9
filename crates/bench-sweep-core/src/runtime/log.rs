// crates/bench-sweep-core/src/runtime/log.rs
// ============================================================================
// Module: Sweep Log Sinks
// Description: JSON-line sinks for structured sweep log events.
// Purpose: Emit operator-readable progress without a logging framework.
// Dependencies: crate::interfaces, serde_json
// ============================================================================

//! ## Overview
//! Each sink serializes [`LogEvent`] values as one JSON object per line and
//! drops events below its minimum level. Write failures are ignored so that
//! logging never interrupts a sweep.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use crate::interfaces::LogEvent;
use crate::interfaces::LogLevel;
use crate::interfaces::SweepLog;

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Sweep log sink that writes JSON lines to stderr.
#[derive(Debug, Clone, Copy)]
pub struct StderrSweepLog {
    /// Events below this level are dropped.
    min_level: LogLevel,
}

impl StderrSweepLog {
    /// Creates a stderr sink at `min_level`.
    #[must_use]
    pub const fn new(min_level: LogLevel) -> Self {
        Self {
            min_level,
        }
    }
}

impl SweepLog for StderrSweepLog {
    fn record(&self, event: &LogEvent) {
        if event.level < self.min_level {
            return;
        }
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Sweep log sink that appends JSON lines to a file.
#[derive(Debug)]
pub struct FileSweepLog {
    /// File handle used for append-only logging.
    file: Mutex<File>,
    /// Events below this level are dropped.
    min_level: LogLevel,
}

impl FileSweepLog {
    /// Opens the log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path, min_level: LogLevel) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
            min_level,
        })
    }
}

impl SweepLog for FileSweepLog {
    fn record(&self, event: &LogEvent) {
        if event.level < self.min_level {
            return;
        }
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// Sweep log sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSweepLog;

impl SweepLog for NoopSweepLog {
    fn record(&self, _event: &LogEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use super::*;

    #[test]
    fn file_sink_filters_by_level() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.log");
        let sink = FileSweepLog::new(&path, LogLevel::Info).unwrap();
        sink.record(&LogEvent::new("readiness_event", LogLevel::Debug, "create"));
        sink.record(&LogEvent::new("restart_retry", LogLevel::Warn, "retrying").with("attempt", 2));
        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 1);
        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["event"], "restart_retry");
        assert_eq!(value["level"], "warn");
        assert_eq!(value["fields"]["attempt"], "2");
    }
}
