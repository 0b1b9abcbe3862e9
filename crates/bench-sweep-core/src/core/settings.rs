// crates/bench-sweep-core/src/core/settings.rs
// ============================================================================
// Module: Static Sweep Settings
// Description: Resolved environment, server, driver, and retry settings.
// Purpose: Carry startup configuration explicitly into runtime components.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`StaticConfig`] is constructed once at startup (by the config crate) and
//! passed by reference into the command builder and process controller.
//! There is no process-wide configuration state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::EngineMapping;
use crate::core::identifiers::EngineVariant;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Resolved static configuration for one sweep invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticConfig {
    /// Host environment settings.
    pub environment: EnvironmentSettings,
    /// Server lifecycle settings.
    pub server: ServerSettings,
    /// Table preparation settings.
    pub prepare: PrepareSettings,
    /// Restart retry policy.
    pub restart: RestartPolicy,
    /// Benchmark driver command settings.
    pub driver: DriverSettings,
}

impl StaticConfig {
    /// Returns the engine variant `mapping` selects at the probe index.
    ///
    /// Runs without a mapping, or without a configured probe index, use the
    /// primary variant.
    #[must_use]
    pub fn engine_variant(&self, mapping: Option<&EngineMapping>) -> EngineVariant {
        self.prepare
            .engine_probe_index
            .zip(mapping)
            .and_then(|(index, mapping)| mapping.variant_at(index))
            .unwrap_or(EngineVariant::Primary)
    }
}

/// Host environment shared by every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentSettings {
    /// CPU affinity list handed to the affinity program, when pinning.
    pub cpuset: Option<String>,
    /// Driver error codes to ignore.
    pub ignore_errors: Vec<String>,
    /// Server listening socket; its appearance signals readiness.
    pub socket: PathBuf,
    /// Working directory for scripts and the driver.
    pub cwd: PathBuf,
    /// Root directory for sweep log directories.
    pub log_dir: PathBuf,
    /// Files copied into the working directory before the first run.
    pub stage_files: Vec<PathBuf>,
}

/// Readiness watcher selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessMode {
    /// Event watcher where the platform supports it, polling otherwise.
    #[default]
    Auto,
    /// OS-level filesystem event watcher.
    Event,
    /// Periodic existence polling.
    Poll,
}

/// Server lifecycle settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Process name matched by kill-all.
    pub process_name: String,
    /// Server binary used for storage initialization.
    pub binary: PathBuf,
    /// Arguments for the storage initialization step.
    pub init_args: Vec<String>,
    /// Storage area wiped between kill and initialize.
    pub storage_dir: PathBuf,
    /// Script launching the server in the background.
    pub start_script: String,
    /// Maximum wait for the readiness file.
    pub readiness_timeout: Duration,
    /// Readiness watcher selection.
    pub readiness_mode: ReadinessMode,
    /// Poll interval for the polling watcher.
    pub poll_interval: Duration,
    /// Maximum wait for killed processes to exit.
    pub shutdown_timeout: Duration,
    /// Pause between readiness and table preparation.
    pub post_ready_delay: Duration,
    /// Optional file receiving server output.
    pub log_file: Option<PathBuf>,
}

/// Table preparation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepareSettings {
    /// Preparation script for the primary engine variant.
    pub script: String,
    /// Preparation script for the alternate engine variant.
    pub alternate_script: Option<String>,
    /// Mapping index whose engine selects the preparation and driver variant.
    pub engine_probe_index: Option<usize>,
    /// Threads used to create tables.
    pub creator_threads: u32,
}

/// Restart retry policy with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPolicy {
    /// Maximum restart attempts per run; `None` retries until healthy.
    pub max_attempts: Option<u32>,
    /// Delay after the first failed attempt.
    pub initial_backoff: Duration,
    /// Upper bound for the delay.
    pub max_backoff: Duration,
}

impl RestartPolicy {
    /// Returns true when `attempt` (1-based) may be started.
    #[must_use]
    pub fn permits(&self, attempt: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempt <= max)
    }

    /// Returns the delay to apply after failed attempt `attempt` (1-based).
    #[must_use]
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.initial_backoff.saturating_mul(1_u32 << exponent).min(self.max_backoff)
    }
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            max_attempts: None,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
        }
    }
}

/// Benchmark driver command settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverSettings {
    /// Driver executable.
    pub program: String,
    /// Driver executable for runs whose mapping selects the alternate engine.
    pub alternate_program: Option<String>,
    /// CPU affinity launcher.
    pub affinity_program: String,
    /// Fixed flags appended after the template.
    pub base_args: Vec<String>,
    /// Flag carrying the joined ignored-error codes.
    pub ignore_errors_flag: String,
    /// Flag carrying the socket path.
    pub socket_flag: String,
    /// Flag carrying the cross-engine percentage.
    pub cross_engine_flag: String,
    /// Flag carrying the thread count.
    pub threads_flag: String,
    /// Trailing benchmark mode keyword.
    pub mode: String,
    /// Item option name to driver flag.
    pub flags: BTreeMap<String, String>,
}

/// Option key carrying a run's engine mapping in [`DriverSettings::flags`].
pub const ENGINE_MAPPING_OPTION: &str = "engine_mapping";
/// Option key carrying a run's transaction selector in [`DriverSettings::flags`].
pub const TXN_OPTION: &str = "txn";

/// Returns the default item option to driver flag table.
#[must_use]
pub fn default_driver_flags() -> BTreeMap<String, String> {
    [
        ("random_type", "--rand-type"),
        ("table_count", "--tables"),
        ("table_size", "--table_size"),
        ("duration", "--time"),
        ("interval", "--report-interval"),
        ("db", "--mysql-db"),
        ("read", "--point_selects"),
        ("write", "--non_index_updates"),
        (ENGINE_MAPPING_OPTION, "--engine-mapping"),
        (TXN_OPTION, "--txn"),
    ]
    .into_iter()
    .map(|(name, flag)| (name.to_string(), flag.to_string()))
    .collect()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
