// crates/bench-sweep-core/src/runtime/process.rs
// ============================================================================
// Module: System Process Controller
// Description: Host implementation of the server and driver lifecycle steps.
// Purpose: Run kill, wipe, initialize, start, prepare, and driver commands.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Every child the controller launches is tracked so an interrupt handler can
//! terminate it with [`SystemProcessController::terminate_children`]. The
//! server start script is detached: the controller returns as soon as it is
//! spawned and readiness is observed separately. Relative program paths with
//! a directory component resolve against the configured working directory.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::process::Child;
use std::process::Command;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use crate::core::EngineVariant;
use crate::core::PrepareSettings;
use crate::core::ServerSettings;
use crate::core::StaticConfig;
use crate::interfaces::CommandStatus;
use crate::interfaces::DriverOutput;
use crate::interfaces::LogEvent;
use crate::interfaces::LogLevel;
use crate::interfaces::PrepareRequest;
use crate::interfaces::ProcessController;
use crate::interfaces::ProcessError;
use crate::interfaces::SweepLog;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Interval between process liveness checks during shutdown.
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Grace period after a forced kill before giving up.
const FORCED_KILL_GRACE: Duration = Duration::from_secs(1);
/// Exit code `pkill`/`pgrep` use when no process matched.
const NO_MATCH_EXIT_CODE: i32 = 1;

// ============================================================================
// SECTION: Controller
// ============================================================================

/// [`ProcessController`] that runs real host commands.
pub struct SystemProcessController {
    /// Server lifecycle settings.
    server: ServerSettings,
    /// Table preparation settings.
    prepare: PrepareSettings,
    /// Working directory for scripts and the driver.
    cwd: PathBuf,
    /// Children launched by this controller.
    children: ChildRegistry,
    /// Sink for lifecycle diagnostics.
    log: Arc<dyn SweepLog>,
}

/// Children that may need termination on interrupt.
#[derive(Default)]
struct ChildRegistry {
    /// Detached server start processes.
    detached: Mutex<Vec<Child>>,
    /// Foreground processes being awaited, by pid.
    foreground: Mutex<BTreeSet<u32>>,
}

impl SystemProcessController {
    /// Creates a controller for `config`.
    #[must_use]
    pub fn new(config: &StaticConfig, log: Arc<dyn SweepLog>) -> Self {
        Self {
            server: config.server.clone(),
            prepare: config.prepare.clone(),
            cwd: config.environment.cwd.clone(),
            children: ChildRegistry::default(),
            log,
        }
    }

    /// Terminates every tracked child process.
    ///
    /// Intended for interrupt handlers; errors are ignored.
    pub fn terminate_children(&self) {
        if let Ok(pids) = self.children.foreground.lock() {
            for pid in pids.iter() {
                let _ = Command::new("kill")
                    .arg(pid.to_string())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .status();
            }
        }
        if let Ok(mut detached) = self.children.detached.lock() {
            for child in detached.iter_mut() {
                let _ = child.kill();
                let _ = child.wait();
            }
            detached.clear();
        }
    }

    /// Resolves `program` against the working directory when it is a relative
    /// path with a directory component.
    fn resolve_program(&self, program: &str) -> PathBuf {
        let path = Path::new(program);
        if path.is_relative() && path.components().count() > 1 {
            self.cwd.join(path)
        } else {
            PathBuf::from(program)
        }
    }

    /// Opens the server output file, or the null device when none is set.
    fn server_output(&self) -> Result<(Stdio, Stdio), ProcessError> {
        let Some(path) = &self.server.log_file else {
            return Ok((Stdio::null(), Stdio::null()));
        };
        let file = open_append(path).map_err(|err| {
            ProcessError::Io(format!("cannot open server log {}: {err}", path.display()))
        })?;
        let clone = file.try_clone().map_err(|err| ProcessError::Io(err.to_string()))?;
        Ok((Stdio::from(file), Stdio::from(clone)))
    }

    /// Spawns `command`, tracks it while it runs, and waits for it to exit.
    fn run_tracked(&self, mut command: Command, step: &str) -> Result<CommandStatus, ProcessError> {
        let program = command.get_program().to_string_lossy().into_owned();
        let mut child = command.spawn().map_err(|err| ProcessError::Spawn {
            program,
            message: err.to_string(),
        })?;
        let pid = child.id();
        self.track(pid);
        let waited = child.wait();
        self.untrack(pid);
        let status = waited.map_err(|err| ProcessError::Io(err.to_string()))?;
        Ok(CommandStatus::from_exit(status, step))
    }

    /// Adds a foreground pid to the registry.
    fn track(&self, pid: u32) {
        if let Ok(mut pids) = self.children.foreground.lock() {
            pids.insert(pid);
        }
    }

    /// Removes a foreground pid from the registry.
    fn untrack(&self, pid: u32) {
        if let Ok(mut pids) = self.children.foreground.lock() {
            pids.remove(&pid);
        }
    }

    /// Reaps detached children that have already exited.
    fn reap_detached(&self) {
        if let Ok(mut detached) = self.children.detached.lock() {
            detached.retain_mut(|child| matches!(child.try_wait(), Ok(None)));
        }
    }

    /// Builds a `pkill`/`pgrep` invocation scoped to the current user.
    fn process_match(&self, program: &str, signal: Option<&str>) -> Command {
        let mut command = Command::new(program);
        if let Some(signal) = signal {
            command.arg(signal);
        }
        if let Ok(user) = env::var("USER") {
            command.args(["-u", &user]);
        }
        command.args(["-x", &self.server.process_name]);
        command.stdout(Stdio::null()).stderr(Stdio::null());
        command
    }

    /// Sends a signal to matching server processes.
    fn signal_server(&self, signal: Option<&str>) -> Result<CommandStatus, ProcessError> {
        let status = self.run_tracked(self.process_match("pkill", signal), "pkill")?;
        Ok(match status {
            CommandStatus::Failed {
                code: Some(NO_MATCH_EXIT_CODE),
                ..
            } => CommandStatus::Success,
            other => other,
        })
    }

    /// Returns true while a matching server process is alive.
    fn server_alive(&self) -> Result<bool, ProcessError> {
        let status = self.run_tracked(self.process_match("pgrep", None), "pgrep")?;
        Ok(status.is_success())
    }

    /// Polls until no server process remains or `timeout` elapses.
    fn await_exit(&self, timeout: Duration) -> Result<bool, ProcessError> {
        let deadline = Instant::now() + timeout;
        loop {
            if !self.server_alive()? {
                return Ok(true);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(false);
            }
            thread::sleep(SHUTDOWN_POLL_INTERVAL.min(remaining));
        }
    }
}

impl ProcessController for SystemProcessController {
    fn kill_all(&self) -> Result<CommandStatus, ProcessError> {
        self.reap_detached();
        let status = self.signal_server(None)?;
        if !status.is_success() {
            return Ok(status);
        }
        if self.await_exit(self.server.shutdown_timeout)? {
            return Ok(CommandStatus::Success);
        }
        self.log.record(
            &LogEvent::new("server_kill_forced", LogLevel::Warn, "server ignored termination")
                .with("process", &self.server.process_name)
                .with("timeout_ms", self.server.shutdown_timeout.as_millis()),
        );
        let _ = self.signal_server(Some("-KILL"))?;
        if self.await_exit(FORCED_KILL_GRACE)? {
            return Ok(CommandStatus::Success);
        }
        Ok(CommandStatus::failed(format!(
            "{} still running after {} ms",
            self.server.process_name,
            self.server.shutdown_timeout.as_millis()
        )))
    }

    fn wipe_storage(&self) -> Result<CommandStatus, ProcessError> {
        let dir = &self.server.storage_dir;
        match wipe_dir(dir) {
            Ok(()) => Ok(CommandStatus::Success),
            Err(err) => Ok(CommandStatus::failed(format!(
                "storage wipe of {} failed: {err}",
                dir.display()
            ))),
        }
    }

    fn initialize_storage(&self) -> Result<CommandStatus, ProcessError> {
        let (stdout, stderr) = self.server_output()?;
        let mut command = Command::new(&self.server.binary);
        command
            .args(&self.server.init_args)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr);
        self.run_tracked(command, "storage initialization")
    }

    fn start_server(&self, server_args: &[String]) -> Result<CommandStatus, ProcessError> {
        self.reap_detached();
        let (stdout, stderr) = self.server_output()?;
        let program = self.resolve_program(&self.server.start_script);
        let child = Command::new(&program)
            .args(server_args)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
            .map_err(|err| ProcessError::Spawn {
                program: program.display().to_string(),
                message: err.to_string(),
            })?;
        self.log.record(
            &LogEvent::new("server_started", LogLevel::Debug, "server start issued")
                .with("pid", child.id())
                .with("args", server_args.join(" ")),
        );
        if let Ok(mut detached) = self.children.detached.lock() {
            detached.push(child);
        }
        Ok(CommandStatus::Success)
    }

    fn prepare_tables(&self, request: &PrepareRequest<'_>) -> Result<CommandStatus, ProcessError> {
        let script = match (request.variant, &self.prepare.alternate_script) {
            (EngineVariant::Alternate, Some(alternate)) => alternate,
            _ => &self.prepare.script,
        };
        let (_, stderr) = self.server_output()?;
        let mut command = Command::new(self.resolve_program(script));
        command
            .arg(request.tables.count.to_string())
            .arg(request.tables.size.to_string())
            .arg(request.creator_threads.to_string());
        if let Some(mapping) = request.mapping {
            command.arg(mapping.as_str());
        }
        command.current_dir(&self.cwd).stdin(Stdio::null()).stdout(Stdio::null()).stderr(stderr);
        self.run_tracked(command, "table preparation")
    }

    fn run_driver(&self, argv: &[String]) -> Result<DriverOutput, ProcessError> {
        let Some((program, args)) = argv.split_first() else {
            return Err(ProcessError::Spawn {
                program: String::new(),
                message: "empty driver command".to_string(),
            });
        };
        let child = Command::new(self.resolve_program(program))
            .args(args)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| ProcessError::Spawn {
                program: program.clone(),
                message: err.to_string(),
            })?;
        let pid = child.id();
        self.track(pid);
        let waited = child.wait_with_output();
        self.untrack(pid);
        let output = waited.map_err(|err| ProcessError::Io(err.to_string()))?;
        Ok(DriverOutput {
            status: CommandStatus::from_exit(output.status, "benchmark driver"),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Opens `path` for appending, creating it when missing.
fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Removes everything inside `dir`, creating it when missing.
fn wipe_dir(dir: &Path) -> io::Result<()> {
    if !dir.exists() {
        return fs::create_dir_all(dir);
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
