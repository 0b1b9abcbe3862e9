// crates/bench-sweep-core/tests/executor.rs
// ============================================================================
// Module: Run Executor Tests
// Description: Restart retries, round handling, and teardown guarantees.
// ============================================================================
//! ## Overview
//! Drives the run executor with scripted stubs and inspects outcomes, the
//! recorded call sequence, and the run log.

#![allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]

mod common;

use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use bench_sweep_core::CancelFlag;
use bench_sweep_core::CommandStatus;
use bench_sweep_core::EngineMapping;
use bench_sweep_core::PollingReadinessWatcher;
use bench_sweep_core::RunClassification;
use bench_sweep_core::RunError;
use bench_sweep_core::RunExecutor;
use bench_sweep_core::RunSpec;
use bench_sweep_core::SweepDescription;
use bench_sweep_core::SweepTimestamp;
use bench_sweep_core::expand;
use common::MemoryLog;
use common::StubController;
use common::StubWatcher;

fn first_spec(description: &SweepDescription) -> RunSpec {
    expand(description, SweepTimestamp::from_unix_millis(5_000)).next().unwrap()
}

fn single_run(rounds: u32) -> SweepDescription {
    SweepDescription {
        name: "exp".to_string(),
        items: vec![common::item("oltp", &[8], &[0], rounds)],
    }
}

#[test]
fn initialization_retries_until_success() {
    let root = tempfile::tempdir().unwrap();
    let config = common::static_config(root.path());
    let controller = Arc::new(StubController::failing_init(2));
    let log = Arc::new(MemoryLog::default());
    let executor = RunExecutor::new(
        &config,
        Arc::clone(&controller),
        StubWatcher {
            ready: true,
        },
        log.clone(),
    );
    let spec = first_spec(&single_run(1));
    let outcome = executor.execute(&spec, root.path()).unwrap();

    assert_eq!(outcome.classification, RunClassification::Success);
    assert_eq!(outcome.restart_attempts, 3);
    assert_eq!(controller.count("initialize_storage"), 3);
    assert_eq!(controller.count("start_server"), 1);
    assert_eq!(controller.count("kill_all"), 4);
    let retries = log.event_names().iter().filter(|name| **name == "restart_retry").count();
    assert_eq!(retries, 2);
}

#[test]
fn lifecycle_steps_run_in_order_with_teardown_last() {
    let root = tempfile::tempdir().unwrap();
    let config = common::static_config(root.path());
    let controller = Arc::new(StubController::default());
    let executor = RunExecutor::new(
        &config,
        Arc::clone(&controller),
        StubWatcher {
            ready: true,
        },
        Arc::new(MemoryLog::default()),
    );
    let mut description = single_run(2);
    description.items[0].server_args = vec!["--ermia-ermia-bypass=TRUE".to_string()];
    let spec = first_spec(&description);
    executor.execute(&spec, root.path()).unwrap();

    assert_eq!(
        controller.calls(),
        vec![
            "kill_all".to_string(),
            "wipe_storage".to_string(),
            "initialize_storage".to_string(),
            "start_server --ermia-ermia-bypass=TRUE".to_string(),
            "prepare_tables 4 ".to_string(),
            "run_driver".to_string(),
            "run_driver".to_string(),
            "kill_all".to_string(),
        ]
    );
}

#[test]
fn failing_round_stops_remaining_rounds_and_keeps_partial_log() {
    let root = tempfile::tempdir().unwrap();
    let config = common::static_config(root.path());
    let controller = Arc::new(StubController::with_driver_statuses(vec![
        CommandStatus::Success,
        CommandStatus::Failed {
            code: Some(2),
            detail: "benchmark driver exited with code 2".to_string(),
        },
    ]));
    let executor = RunExecutor::new(
        &config,
        Arc::clone(&controller),
        StubWatcher {
            ready: true,
        },
        Arc::new(MemoryLog::default()),
    );
    let spec = first_spec(&single_run(4));
    let outcome = executor.execute(&spec, root.path()).unwrap();

    assert_eq!(outcome.classification, RunClassification::BenchmarkFailure);
    assert_eq!(controller.count("run_driver"), 2);
    assert!(outcome.error.as_deref().unwrap().starts_with("round 2 of 4"));
    let log_path = outcome.log_path.unwrap();
    assert_eq!(log_path, root.path().join(spec.log_file_name()));
    let contents = fs::read_to_string(log_path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert!(lines[0].starts_with("Command: taskset -c 0-3 sysbench oltp_read_write"));
    assert_eq!(lines[1], "= RUN 1 =");
    assert_eq!(lines[2], "round 1 tps: 1234.5");
    assert_eq!(lines[3], "= RUN 2 =");
    assert!(!contents.contains("= RUN 3 ="));
    assert_eq!(controller.calls().last().map(String::as_str), Some("kill_all"));
}

#[test]
fn readiness_timeout_is_initialization_failure() {
    let root = tempfile::tempdir().unwrap();
    let config = common::static_config(root.path());
    let controller = Arc::new(StubController::default());
    let executor = RunExecutor::new(
        &config,
        Arc::clone(&controller),
        StubWatcher {
            ready: false,
        },
        Arc::new(MemoryLog::default()),
    );
    let spec = first_spec(&single_run(1));
    let outcome = executor.execute(&spec, root.path()).unwrap();

    assert_eq!(outcome.classification, RunClassification::InitializationFailure);
    assert!(outcome.error.as_deref().unwrap().contains("did not appear within 2000 ms"));
    assert!(outcome.log_path.is_none());
    assert_eq!(controller.count("run_driver"), 0);
    assert_eq!(controller.count("prepare_tables"), 0);
    assert_eq!(controller.calls().last().map(String::as_str), Some("kill_all"));
}

#[test]
fn retry_cap_ends_in_initialization_failure() {
    let root = tempfile::tempdir().unwrap();
    let mut config = common::static_config(root.path());
    config.restart.max_attempts = Some(2);
    let controller = Arc::new(StubController::failing_prepare(5));
    let executor = RunExecutor::new(
        &config,
        Arc::clone(&controller),
        StubWatcher {
            ready: true,
        },
        Arc::new(MemoryLog::default()),
    );
    let spec = first_spec(&single_run(1));
    let outcome = executor.execute(&spec, root.path()).unwrap();

    assert_eq!(outcome.classification, RunClassification::InitializationFailure);
    assert_eq!(outcome.restart_attempts, 2);
    assert_eq!(controller.count("prepare_tables"), 2);
    assert!(outcome.error.as_deref().unwrap().contains("after 2 attempts"));
}

#[test]
fn cancelled_sweep_skips_restart() {
    let root = tempfile::tempdir().unwrap();
    let config = common::static_config(root.path());
    let controller = Arc::new(StubController::default());
    let cancel = CancelFlag::new();
    cancel.cancel();
    let executor = RunExecutor::new(
        &config,
        Arc::clone(&controller),
        StubWatcher {
            ready: true,
        },
        Arc::new(MemoryLog::default()),
    )
    .with_cancel_flag(cancel);
    let spec = first_spec(&single_run(1));
    let outcome = executor.execute(&spec, root.path()).unwrap();

    assert_eq!(outcome.classification, RunClassification::InitializationFailure);
    assert_eq!(outcome.restart_attempts, 0);
    assert_eq!(controller.calls(), vec!["kill_all".to_string()]);
}

#[test]
fn cancellation_during_readiness_wait_ends_bring_up() {
    let root = tempfile::tempdir().unwrap();
    let mut config = common::static_config(root.path());
    config.server.readiness_timeout = Duration::from_secs(30);
    let controller = Arc::new(StubController::default());
    let log = Arc::new(MemoryLog::default());
    let cancel = CancelFlag::new();
    let watcher = PollingReadinessWatcher::new(Duration::from_millis(10), log.clone())
        .with_cancel_flag(cancel.clone());
    let executor = RunExecutor::new(&config, Arc::clone(&controller), watcher, log.clone())
        .with_cancel_flag(cancel.clone());
    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        cancel.cancel();
    });
    let start = Instant::now();
    let outcome = executor.execute(&first_spec(&single_run(1)), root.path()).unwrap();
    canceller.join().unwrap();

    assert!(start.elapsed() < Duration::from_secs(10));
    assert_eq!(outcome.classification, RunClassification::InitializationFailure);
    assert_eq!(outcome.restart_attempts, 1);
    assert!(outcome.error.as_deref().unwrap().contains("cancelled"));
    assert!(!log.event_names().contains(&"readiness_failed"));
}

#[test]
fn driver_fault_propagates_after_teardown() {
    let root = tempfile::tempdir().unwrap();
    let config = common::static_config(root.path());
    let controller = Arc::new(StubController::faulty_driver());
    let executor = RunExecutor::new(
        &config,
        Arc::clone(&controller),
        StubWatcher {
            ready: true,
        },
        Arc::new(MemoryLog::default()),
    );
    let spec = first_spec(&single_run(1));
    let err = executor.execute(&spec, root.path()).unwrap_err();

    assert!(matches!(err, RunError::Driver { .. }));
    let partial = err.log_path().unwrap();
    assert_eq!(partial, root.path().join(spec.log_file_name()));
    assert!(fs::read_to_string(partial).unwrap().starts_with("Command: "));
    assert_eq!(controller.calls().last().map(String::as_str), Some("kill_all"));
}

#[test]
fn teardown_failure_does_not_change_outcome() {
    let root = tempfile::tempdir().unwrap();
    let mut config = common::static_config(root.path());
    config.restart.max_attempts = Some(1);
    let controller = Arc::new(StubController::failing_kill());
    let log = Arc::new(MemoryLog::default());
    let executor = RunExecutor::new(
        &config,
        Arc::clone(&controller),
        StubWatcher {
            ready: true,
        },
        log.clone(),
    );
    let spec = first_spec(&single_run(1));
    let outcome = executor.execute(&spec, root.path()).unwrap();

    assert_eq!(outcome.classification, RunClassification::InitializationFailure);
    assert!(log.event_names().contains(&"teardown_failed"));
}

#[test]
fn alternate_engine_mapping_reaches_preparation() {
    let root = tempfile::tempdir().unwrap();
    let config = common::static_config(root.path());
    let controller = Arc::new(StubController::default());
    let executor = RunExecutor::new(
        &config,
        Arc::clone(&controller),
        StubWatcher {
            ready: true,
        },
        Arc::new(MemoryLog::default()),
    );
    let mut description = single_run(1);
    description.items[0].mappings = Some(vec![EngineMapping::parse("IIIIIE").unwrap()]);
    let spec = first_spec(&description);
    executor.execute(&spec, root.path()).unwrap();
    assert!(controller.calls().contains(&"prepare_tables 4 IIIIIE".to_string()));
}

#[test]
fn stale_socket_is_removed_before_start() {
    let root = tempfile::tempdir().unwrap();
    let config = common::static_config(root.path());
    fs::write(&config.environment.socket, b"").unwrap();
    let executor = RunExecutor::new(
        &config,
        Arc::new(StubController::default()),
        StubWatcher {
            ready: true,
        },
        Arc::new(MemoryLog::default()),
    );
    let spec = first_spec(&single_run(1));
    executor.execute(&spec, root.path()).unwrap();
    assert!(!config.environment.socket.exists());
}
