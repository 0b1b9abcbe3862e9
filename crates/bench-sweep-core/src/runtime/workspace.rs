// crates/bench-sweep-core/src/runtime/workspace.rs
// ============================================================================
// Module: Sweep Workspace
// Description: Sweep log directory preparation and file staging.
// Purpose: Give each sweep a fresh log directory without losing older results.
// Dependencies: crate::interfaces, thiserror, time
// ============================================================================

//! ## Overview
//! A sweep writes into `<log root>/<sweep name>`. An existing directory from
//! an earlier sweep is renamed to `<sweep name>-YYYY-MM-DD-HH:MM` (UTC) before
//! a fresh one is created; a numeric suffix resolves archive name collisions.
//! Staged files already at their target path are left untouched.
//! Failures here are fatal: no run starts without a place to write its log.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;
use time::OffsetDateTime;

use crate::interfaces::LogEvent;
use crate::interfaces::LogLevel;
use crate::interfaces::SweepLog;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Sweep-level failures that stop a sweep before any run starts.
#[derive(Debug, Error)]
pub enum SweepError {
    /// The sweep log directory could not be archived or created.
    #[error("sweep log directory {}: {message}", .path.display())]
    LogDirectory {
        /// Directory involved.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },
    /// A staged file could not be copied into the working directory.
    #[error("failed to stage {}: {message}", .path.display())]
    Stage {
        /// File being staged.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },
}

// ============================================================================
// SECTION: Log Directory
// ============================================================================

/// Prepares `<log_root>/<sweep_name>` and returns its path.
///
/// # Errors
///
/// Returns [`SweepError::LogDirectory`] when archiving or creation fails.
pub fn prepare_sweep_dir(
    log_root: &Path,
    sweep_name: &str,
    log: &dyn SweepLog,
) -> Result<PathBuf, SweepError> {
    let dir = log_root.join(sweep_name);
    if fs::symlink_metadata(&dir).is_ok() {
        let archived = archive_path(log_root, sweep_name, OffsetDateTime::now_utc());
        fs::rename(&dir, &archived).map_err(|err| SweepError::LogDirectory {
            path: dir.clone(),
            message: format!("archive to {} failed: {err}", archived.display()),
        })?;
        log.record(
            &LogEvent::new("log_dir_archived", LogLevel::Info, "archived previous sweep logs")
                .with("from", dir.display())
                .with("to", archived.display()),
        );
    }
    fs::create_dir_all(&dir).map_err(|err| SweepError::LogDirectory {
        path: dir.clone(),
        message: err.to_string(),
    })?;
    Ok(dir)
}

/// Picks an unused archive path for `sweep_name` at `now`.
fn archive_path(log_root: &Path, sweep_name: &str, now: OffsetDateTime) -> PathBuf {
    let stamp = format!(
        "{:04}-{:02}-{:02}-{:02}:{:02}",
        now.year(),
        u8::from(now.month()),
        now.day(),
        now.hour(),
        now.minute()
    );
    let base = log_root.join(format!("{sweep_name}-{stamp}"));
    if fs::symlink_metadata(&base).is_err() {
        return base;
    }
    let mut suffix: u32 = 1;
    loop {
        let candidate = log_root.join(format!("{sweep_name}-{stamp}-{suffix}"));
        if fs::symlink_metadata(&candidate).is_err() {
            return candidate;
        }
        suffix = suffix.saturating_add(1);
    }
}

// ============================================================================
// SECTION: Staging
// ============================================================================

/// Copies each file in `files` into `cwd`, keeping its file name.
///
/// # Errors
///
/// Returns [`SweepError::Stage`] when a file has no name or cannot be copied.
pub fn stage_files(files: &[PathBuf], cwd: &Path, log: &dyn SweepLog) -> Result<(), SweepError> {
    for file in files {
        let name = file.file_name().ok_or_else(|| SweepError::Stage {
            path: file.clone(),
            message: "path has no file name".to_string(),
        })?;
        let target = cwd.join(name);
        if same_file(file, &target)? {
            log.record(
                &LogEvent::new("file_staged", LogLevel::Debug, "file already in place")
                    .with("source", file.display())
                    .with("target", target.display())
                    .with("skipped", true),
            );
            continue;
        }
        fs::copy(file, &target).map_err(|err| SweepError::Stage {
            path: file.clone(),
            message: err.to_string(),
        })?;
        log.record(
            &LogEvent::new("file_staged", LogLevel::Debug, "staged file")
                .with("source", file.display())
                .with("target", target.display())
                .with("skipped", false),
        );
    }
    Ok(())
}

/// Returns true when `target` already resolves to `source`.
fn same_file(source: &Path, target: &Path) -> Result<bool, SweepError> {
    let source = fs::canonicalize(source).map_err(|err| SweepError::Stage {
        path: source.to_path_buf(),
        message: err.to_string(),
    })?;
    Ok(fs::canonicalize(target).is_ok_and(|target| target == source))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use super::*;

    #[test]
    fn archive_name_uses_utc_minutes() {
        let root = tempfile::tempdir().unwrap();
        // 2026-03-07 09:05:59 UTC
        let now = OffsetDateTime::from_unix_timestamp(1_772_874_359).unwrap();
        let path = archive_path(root.path(), "sweep", now);
        assert_eq!(path, root.path().join("sweep-2026-03-07-09:05"));
    }

    #[test]
    fn archive_name_collision_gets_suffix() {
        let root = tempfile::tempdir().unwrap();
        let now = OffsetDateTime::from_unix_timestamp(1_772_874_300).unwrap();
        fs::create_dir(root.path().join("sweep-2026-03-07-09:05")).unwrap();
        fs::create_dir(root.path().join("sweep-2026-03-07-09:05-1")).unwrap();
        let path = archive_path(root.path(), "sweep", now);
        assert_eq!(path, root.path().join("sweep-2026-03-07-09:05-2"));
    }

    #[test]
    fn staging_into_own_directory_keeps_contents() {
        let root = tempfile::tempdir().unwrap();
        let script = root.path().join("prepare_tables.sh");
        fs::write(&script, b"#!/bin/sh\necho prepare\n").unwrap();
        stage_files(&[script.clone()], root.path(), &crate::runtime::NoopSweepLog).unwrap();
        assert_eq!(fs::read(&script).unwrap(), b"#!/bin/sh\necho prepare\n");
    }

    #[test]
    fn staging_through_relative_cwd_keeps_contents() {
        let root = tempfile::tempdir().unwrap();
        let scripts = root.path().join("scripts");
        fs::create_dir(&scripts).unwrap();
        let script = scripts.join("start_mysqld.sh");
        fs::write(&script, b"#!/bin/sh\nexec mysqld\n").unwrap();
        let cwd = scripts.join("..").join("scripts");
        stage_files(&[script.clone()], &cwd, &crate::runtime::NoopSweepLog).unwrap();
        assert_eq!(fs::read(&script).unwrap(), b"#!/bin/sh\nexec mysqld\n");
    }

    #[test]
    fn staging_copies_into_other_directory() {
        let root = tempfile::tempdir().unwrap();
        let source = root.path().join("run.sh");
        let cwd = root.path().join("work");
        fs::create_dir(&cwd).unwrap();
        fs::write(&source, b"echo run\n").unwrap();
        stage_files(&[source.clone()], &cwd, &crate::runtime::NoopSweepLog).unwrap();
        assert_eq!(fs::read(cwd.join("run.sh")).unwrap(), b"echo run\n");
        assert_eq!(fs::read(&source).unwrap(), b"echo run\n");
    }

    #[test]
    fn missing_staged_file_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let result =
            stage_files(&[root.path().join("absent.sh")], root.path(), &crate::runtime::NoopSweepLog);
        assert!(matches!(result, Err(SweepError::Stage { .. })));
    }
}
