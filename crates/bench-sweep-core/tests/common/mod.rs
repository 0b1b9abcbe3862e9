// crates/bench-sweep-core/tests/common/mod.rs
// =============================================================================
// Module: Core Test Helpers
// Description: Fixtures and recording stubs for sweep runtime tests.
// Purpose: Exercise the executor and driver without a real server.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]
#![allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use bench_sweep_core::BenchmarkItem;
use bench_sweep_core::CommandStatus;
use bench_sweep_core::DriverOutput;
use bench_sweep_core::DriverSettings;
use bench_sweep_core::EnvironmentSettings;
use bench_sweep_core::LogEvent;
use bench_sweep_core::Notifier;
use bench_sweep_core::PrepareRequest;
use bench_sweep_core::PrepareSettings;
use bench_sweep_core::ProcessController;
use bench_sweep_core::ProcessError;
use bench_sweep_core::ReadinessError;
use bench_sweep_core::ReadinessMode;
use bench_sweep_core::ReadinessWatcher;
use bench_sweep_core::RestartPolicy;
use bench_sweep_core::ServerSettings;
use bench_sweep_core::StaticConfig;
use bench_sweep_core::SweepDescription;
use bench_sweep_core::SweepEvent;
use bench_sweep_core::SweepLog;
use bench_sweep_core::TableLayout;
use bench_sweep_core::core::settings::default_driver_flags;
use bench_sweep_core::render_message;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Builds a static config rooted at `root` with millisecond backoff.
pub fn static_config(root: &Path) -> StaticConfig {
    StaticConfig {
        environment: EnvironmentSettings {
            cpuset: Some("0-3".to_string()),
            ignore_errors: vec!["1213".to_string(), "1020".to_string()],
            socket: root.join("mysql.sock"),
            cwd: root.to_path_buf(),
            log_dir: root.join("logs"),
            stage_files: Vec::new(),
        },
        server: ServerSettings {
            process_name: "mysqld".to_string(),
            binary: root.join("bin").join("mysqld"),
            init_args: vec!["--initialize".to_string()],
            storage_dir: root.join("storage"),
            start_script: "./start_mysqld.sh".to_string(),
            readiness_timeout: Duration::from_secs(2),
            readiness_mode: ReadinessMode::Poll,
            poll_interval: Duration::from_millis(10),
            shutdown_timeout: Duration::from_millis(500),
            post_ready_delay: Duration::ZERO,
            log_file: None,
        },
        prepare: PrepareSettings {
            script: "./prepare_tables.sh".to_string(),
            alternate_script: Some("./prepare_tables_alt.sh".to_string()),
            engine_probe_index: Some(5),
            creator_threads: 64,
        },
        restart: RestartPolicy {
            max_attempts: None,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(4),
        },
        driver: DriverSettings {
            program: "sysbench".to_string(),
            alternate_program: None,
            affinity_program: "taskset".to_string(),
            base_args: vec![
                "--mysql_storage_engine=ERMIA".to_string(),
                "--create-secondary=off".to_string(),
                "--db-driver=mysql".to_string(),
                "--range_selects=off".to_string(),
            ],
            ignore_errors_flag: "--mysql-ignore-errors".to_string(),
            socket_flag: "--mysql-socket".to_string(),
            cross_engine_flag: "--innodb_percentage".to_string(),
            threads_flag: "--threads".to_string(),
            mode: "run".to_string(),
            flags: default_driver_flags(),
        },
    }
}

/// Builds a plain benchmark item.
pub fn item(id: &str, threads: &[u32], percentages: &[u8], rounds: u32) -> BenchmarkItem {
    BenchmarkItem {
        id: id.to_string(),
        bench_script: "oltp_read_write".to_string(),
        mappings: None,
        threads: threads.to_vec(),
        txns: None,
        cross_engine_percentages: percentages.to_vec(),
        rounds,
        pairings: Vec::new(),
        server_args: Vec::new(),
        tables: TableLayout {
            count: 4,
            size: 1000,
        },
        options: BTreeMap::new(),
    }
}

/// The two-by-two sweep: threads {1, 2} by cross-engine {0, 50}.
pub fn two_by_two() -> SweepDescription {
    SweepDescription {
        name: "exp".to_string(),
        items: vec![item("oltp", &[1, 2], &[0, 50], 1)],
    }
}

// ============================================================================
// SECTION: Process Stub
// ============================================================================

/// Scripted process controller that records every call.
#[derive(Default)]
pub struct StubController {
    /// Operation names in call order.
    calls: Mutex<Vec<String>>,
    /// Remaining `initialize_storage` failures.
    init_failures: Mutex<u32>,
    /// Remaining `prepare_tables` failures.
    prepare_failures: Mutex<u32>,
    /// Driver statuses by call; success once exhausted.
    driver_statuses: Mutex<VecDeque<CommandStatus>>,
    /// When set, `run_driver` raises a process fault.
    driver_fault: bool,
    /// When set, `kill_all` reports failure.
    kill_fails: bool,
}

impl StubController {
    /// Fails `initialize_storage` the first `count` times.
    pub fn failing_init(count: u32) -> Self {
        Self {
            init_failures: Mutex::new(count),
            ..Self::default()
        }
    }

    /// Fails `prepare_tables` the first `count` times.
    pub fn failing_prepare(count: u32) -> Self {
        Self {
            prepare_failures: Mutex::new(count),
            ..Self::default()
        }
    }

    /// Returns `statuses` from successive driver calls.
    pub fn with_driver_statuses(statuses: Vec<CommandStatus>) -> Self {
        Self {
            driver_statuses: Mutex::new(statuses.into()),
            ..Self::default()
        }
    }

    /// Raises a fault from every driver call.
    pub fn faulty_driver() -> Self {
        Self {
            driver_fault: true,
            ..Self::default()
        }
    }

    /// Reports failure from every kill.
    pub fn failing_kill() -> Self {
        Self {
            kill_fails: true,
            ..Self::default()
        }
    }

    /// Returns recorded operation names.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Counts calls of `operation`.
    pub fn count(&self, operation: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|call| call.starts_with(operation)).count()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn take_failure(counter: &Mutex<u32>) -> bool {
        let mut remaining = counter.lock().unwrap();
        if *remaining == 0 {
            return false;
        }
        *remaining -= 1;
        true
    }
}

impl ProcessController for StubController {
    fn kill_all(&self) -> Result<CommandStatus, ProcessError> {
        self.record("kill_all");
        if self.kill_fails {
            return Ok(CommandStatus::failed("pkill exited with code 2"));
        }
        Ok(CommandStatus::Success)
    }

    fn wipe_storage(&self) -> Result<CommandStatus, ProcessError> {
        self.record("wipe_storage");
        Ok(CommandStatus::Success)
    }

    fn initialize_storage(&self) -> Result<CommandStatus, ProcessError> {
        self.record("initialize_storage");
        if Self::take_failure(&self.init_failures) {
            return Ok(CommandStatus::Failed {
                code: Some(1),
                detail: "storage initialization exited with code 1".to_string(),
            });
        }
        Ok(CommandStatus::Success)
    }

    fn start_server(&self, server_args: &[String]) -> Result<CommandStatus, ProcessError> {
        self.record(format!("start_server {}", server_args.join(" ")));
        Ok(CommandStatus::Success)
    }

    fn prepare_tables(&self, request: &PrepareRequest<'_>) -> Result<CommandStatus, ProcessError> {
        let mapping = request.mapping.map(|mapping| mapping.to_string()).unwrap_or_default();
        self.record(format!("prepare_tables {} {mapping}", request.tables.count));
        if Self::take_failure(&self.prepare_failures) {
            return Ok(CommandStatus::failed("table preparation exited with code 1"));
        }
        Ok(CommandStatus::Success)
    }

    fn run_driver(&self, argv: &[String]) -> Result<DriverOutput, ProcessError> {
        let round = self.count("run_driver") + 1;
        self.record("run_driver");
        if self.driver_fault {
            return Err(ProcessError::Spawn {
                program: argv.first().cloned().unwrap_or_default(),
                message: "No such file or directory".to_string(),
            });
        }
        let status = self.driver_statuses.lock().unwrap().pop_front().unwrap_or(CommandStatus::Success);
        Ok(DriverOutput {
            status,
            stdout: format!("round {round} tps: 1234.5\n"),
            stderr: String::new(),
        })
    }
}

// ============================================================================
// SECTION: Readiness Stub
// ============================================================================

/// Readiness watcher that succeeds or times out immediately.
pub struct StubWatcher {
    /// Whether the file is reported as present.
    pub ready: bool,
}

impl ReadinessWatcher for StubWatcher {
    fn wait_for_file(&self, path: &Path, timeout: Duration) -> Result<(), ReadinessError> {
        if self.ready {
            return Ok(());
        }
        Err(ReadinessError::Timeout {
            path: path.to_path_buf(),
            waited: timeout,
        })
    }
}

// ============================================================================
// SECTION: Notification and Log Sinks
// ============================================================================

/// Notifier that keeps every rendered message.
#[derive(Default)]
pub struct RecordingNotifier {
    /// Rendered messages in delivery order.
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    /// Returns delivered messages.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: &SweepEvent<'_>) {
        self.messages.lock().unwrap().push(render_message(event));
    }
}

/// Log sink that keeps events in memory.
#[derive(Default)]
pub struct MemoryLog {
    /// Recorded events.
    events: Mutex<Vec<LogEvent>>,
}

impl MemoryLog {
    /// Returns the identifiers of recorded events.
    pub fn event_names(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|event| event.event).collect()
    }

    /// Returns every recorded event.
    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl SweepLog for MemoryLog {
    fn record(&self, event: &LogEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
