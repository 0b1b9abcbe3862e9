// crates/bench-sweep-core/tests/readiness.rs
// ============================================================================
// Module: Readiness Watcher Tests
// Description: File appearance detection for event and polling watchers.
// ============================================================================
//! ## Overview
//! Exercises both watcher implementations against a real temp directory.

#![allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]

mod common;

use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use bench_sweep_core::CancelFlag;
use bench_sweep_core::EventReadinessWatcher;
use bench_sweep_core::NoopSweepLog;
use bench_sweep_core::PollingReadinessWatcher;
use bench_sweep_core::ReadinessError;
use bench_sweep_core::ReadinessMode;
use bench_sweep_core::ReadinessWatcher;
use bench_sweep_core::SweepLog;
use bench_sweep_core::select_watcher;
use common::MemoryLog;

const POLL: Duration = Duration::from_millis(20);

fn watchers() -> Vec<(&'static str, Box<dyn ReadinessWatcher>)> {
    let log: Arc<dyn SweepLog> = Arc::new(NoopSweepLog);
    vec![
        ("event", Box::new(EventReadinessWatcher::new(POLL, Arc::clone(&log)))),
        ("poll", Box::new(PollingReadinessWatcher::new(POLL, log))),
    ]
}

#[test]
fn existing_file_returns_immediately() {
    for (name, watcher) in watchers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mysql.sock");
        fs::write(&path, b"").unwrap();
        let started = Instant::now();
        watcher.wait_for_file(&path, Duration::from_secs(5)).unwrap();
        assert!(started.elapsed() < Duration::from_secs(1), "{name} watcher was slow");
    }
}

#[test]
fn file_created_later_is_observed() {
    for (name, watcher) in watchers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mysql.sock");
        let writer_path = path.clone();
        let writer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(300));
            fs::write(writer_path, b"").unwrap();
        });
        let started = Instant::now();
        let result = watcher.wait_for_file(&path, Duration::from_secs(5));
        writer.join().unwrap();
        assert!(result.is_ok(), "{name} watcher missed the file");
        assert!(started.elapsed() < Duration::from_secs(4), "{name} watcher was slow");
    }
}

#[test]
fn unrelated_files_do_not_satisfy_the_wait() {
    for (name, watcher) in watchers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mysql.sock");
        let other = dir.path().join("mysql.pid");
        let writer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            fs::write(other, b"1").unwrap();
        });
        let result = watcher.wait_for_file(&path, Duration::from_millis(400));
        writer.join().unwrap();
        assert!(
            matches!(result, Err(ReadinessError::Timeout { .. })),
            "{name} watcher accepted an unrelated file"
        );
    }
}

#[test]
fn missing_file_times_out() {
    for (name, watcher) in watchers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never.sock");
        let started = Instant::now();
        let err = watcher.wait_for_file(&path, Duration::from_millis(200)).unwrap_err();
        assert!(matches!(err, ReadinessError::Timeout { .. }), "{name} watcher: {err}");
        assert!(started.elapsed() >= Duration::from_millis(200));
    }
}

#[test]
fn directory_path_is_rejected() {
    for (name, watcher) in watchers() {
        let dir = tempfile::tempdir().unwrap();
        let err = watcher.wait_for_file(dir.path(), Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ReadinessError::PathIsDirectory(_)), "{name} watcher: {err}");
    }
}

#[test]
fn selected_watchers_observe_existing_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mysql.sock");
    fs::write(&path, b"").unwrap();
    for mode in [ReadinessMode::Auto, ReadinessMode::Event, ReadinessMode::Poll] {
        let watcher = select_watcher(mode, POLL, CancelFlag::new(), Arc::new(NoopSweepLog));
        watcher.wait_for_file(&path, Duration::from_secs(1)).unwrap();
    }
}

#[test]
fn cancellation_ends_the_wait_before_the_timeout() {
    for mode in [ReadinessMode::Event, ReadinessMode::Poll] {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mysql.sock");
        let cancel = CancelFlag::new();
        let watcher = select_watcher(mode, POLL, cancel.clone(), Arc::new(NoopSweepLog));
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            cancel.cancel();
        });
        let start = Instant::now();
        let err = watcher.wait_for_file(&path, Duration::from_secs(30)).unwrap_err();
        canceller.join().unwrap();
        assert!(matches!(err, ReadinessError::Cancelled(_)), "{mode:?} watcher: {err}");
        assert!(start.elapsed() < Duration::from_secs(5), "{mode:?} watcher ignored cancel");
    }
}

#[test]
fn filesystem_events_are_logged_with_their_paths() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mysql.sock");
    let log = Arc::new(MemoryLog::default());
    let watcher = EventReadinessWatcher::new(POLL, log.clone());
    let target = path.clone();
    let creator = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        fs::write(dir.path().join("other.pid"), b"1").unwrap();
        fs::write(&target, b"").unwrap();
        dir
    });
    watcher.wait_for_file(&path, Duration::from_secs(5)).unwrap();
    let _dir = creator.join().unwrap();

    let events = log.events();
    if events.iter().any(|event| event.event == "readiness_fallback") {
        return;
    }
    let observed: Vec<_> =
        events.iter().filter(|event| event.event == "readiness_event").collect();
    assert!(!observed.is_empty());
    assert!(observed.iter().all(|event| event.fields.contains_key("paths")));
    assert!(observed.iter().any(|event| event.fields["paths"].contains("mysql.sock")));
}
