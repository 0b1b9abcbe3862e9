// crates/bench-sweep-config/src/config.rs
// ============================================================================
// Module: Bench Sweep Configuration
// Description: Configuration loading and validation for sweep descriptions.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: bench-sweep-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every problem is reported before the first run starts, because a sweep
//! that fails halfway through on a typo wastes hours of machine time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use bench_sweep_core::DriverSettings;
use bench_sweep_core::EnvironmentSettings;
use bench_sweep_core::PrepareSettings;
use bench_sweep_core::ReadinessMode;
use bench_sweep_core::RestartPolicy;
use bench_sweep_core::ServerSettings;
use bench_sweep_core::StaticConfig;
use bench_sweep_core::SweepDescription;
use bench_sweep_core::TableLayout;
use bench_sweep_core::core::settings::default_driver_flags;
use serde::Deserialize;
use thiserror::Error;

use crate::benchmark::BenchmarkConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "bench-sweep.toml";
/// Environment variable holding the configuration path.
pub(crate) const CONFIG_ENV_VAR: &str = "BENCH_SWEEP_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum readiness timeout in seconds.
pub(crate) const MAX_READINESS_TIMEOUT_SECS: u64 = 3_600;
/// Maximum readiness poll interval in milliseconds.
pub(crate) const MAX_POLL_INTERVAL_MS: u64 = 60_000;
/// Maximum shutdown wait in milliseconds.
pub(crate) const MAX_SHUTDOWN_TIMEOUT_MS: u64 = 600_000;
/// Maximum restart backoff in milliseconds.
pub(crate) const MAX_BACKOFF_MS: u64 = 3_600_000;
/// Lower notification timeout bound in milliseconds.
pub(crate) const MIN_NOTIFY_TIMEOUT_MS: u64 = 100;
/// Upper notification timeout bound in milliseconds.
pub(crate) const MAX_NOTIFY_TIMEOUT_MS: u64 = 60_000;

// ============================================================================
// SECTION: Configuration Model
// ============================================================================

/// Sweep description file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepConfig {
    /// Sweep name; names the sweep log directory.
    pub name: String,
    /// Host environment.
    pub system: SystemConfig,
    /// Server lifecycle settings.
    pub server: ServerConfig,
    /// Table preparation settings.
    #[serde(default)]
    pub prepare: PrepareConfig,
    /// Restart retry policy.
    #[serde(default)]
    pub restart: RestartConfig,
    /// Benchmark driver command settings.
    #[serde(default)]
    pub driver: DriverConfig,
    /// Outcome notification settings.
    #[serde(default)]
    pub notify: NotifyConfig,
    /// Benchmark items in execution order.
    #[serde(default, rename = "benchmark")]
    pub benchmarks: Vec<BenchmarkConfig>,
}

/// `[system]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SystemConfig {
    /// CPU list for the affinity program; unpinned when absent.
    #[serde(default)]
    pub cpuset: Option<String>,
    /// Driver error codes to ignore.
    #[serde(default)]
    pub ignore_errors: Vec<String>,
    /// Server socket path; its appearance signals readiness.
    pub socket: String,
    /// Working directory for scripts and the driver.
    #[serde(default = "default_cwd")]
    pub cwd: String,
    /// Log root; relative paths resolve against `cwd`.
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    /// Files copied into `cwd` before the first run.
    #[serde(default)]
    pub stage_files: Vec<String>,
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Exact process name matched by kill-all.
    #[serde(default = "default_process_name")]
    pub process_name: String,
    /// Storage initialization binary.
    pub binary: String,
    /// Arguments for storage initialization.
    #[serde(default = "default_init_args")]
    pub init_args: Vec<String>,
    /// Storage area wiped before each initialization.
    pub storage_dir: String,
    /// Background start script.
    #[serde(default = "default_start_script")]
    pub start_script: String,
    /// Seconds to wait for the socket to appear.
    #[serde(default = "default_readiness_timeout_secs")]
    pub readiness_timeout_secs: u64,
    /// Readiness watcher selection.
    #[serde(default)]
    pub readiness_mode: ReadinessMode,
    /// Poll interval for the polling watcher.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// How long kill-all waits for matching processes to exit.
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,
    /// Extra delay after readiness before table preparation.
    #[serde(default)]
    pub post_ready_delay_ms: u64,
    /// File receiving server output; discarded when absent.
    #[serde(default)]
    pub log_file: Option<String>,
}

/// `[prepare]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrepareConfig {
    /// Preparation script for the primary engine variant.
    #[serde(default = "default_prepare_script")]
    pub script: String,
    /// Preparation script for the alternate engine variant.
    #[serde(default)]
    pub alternate_script: Option<String>,
    /// Engine mapping position selecting the variant.
    #[serde(default)]
    pub engine_probe_index: Option<usize>,
    /// Threads used to create tables.
    #[serde(default = "default_creator_threads")]
    pub creator_threads: u32,
    /// Table count used when an item sets none.
    #[serde(default = "default_table_count")]
    pub table_count: u64,
    /// Table size used when an item sets none.
    #[serde(default = "default_table_size")]
    pub table_size: u64,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            script: default_prepare_script(),
            alternate_script: None,
            engine_probe_index: None,
            creator_threads: default_creator_threads(),
            table_count: default_table_count(),
            table_size: default_table_size(),
        }
    }
}

/// `[restart]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RestartConfig {
    /// Maximum restart attempts per run; unlimited when absent.
    #[serde(default)]
    pub max_attempts: Option<u32>,
    /// Delay after the first failed attempt.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Backoff cap.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for RestartConfig {
    fn default() -> Self {
        Self {
            max_attempts: None,
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// `[driver]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DriverConfig {
    /// Driver executable.
    #[serde(default = "default_driver_program")]
    pub program: String,
    /// Driver executable for runs whose mapping selects the alternate engine.
    #[serde(default)]
    pub alternate_program: Option<String>,
    /// CPU affinity launcher.
    #[serde(default = "default_affinity_program")]
    pub affinity_program: String,
    /// Fixed arguments after the socket flag.
    #[serde(default = "default_base_args")]
    pub base_args: Vec<String>,
    /// Flag carrying ignored error codes.
    #[serde(default = "default_ignore_errors_flag")]
    pub ignore_errors_flag: String,
    /// Flag carrying the socket path.
    #[serde(default = "default_socket_flag")]
    pub socket_flag: String,
    /// Flag carrying the cross-engine percentage.
    #[serde(default = "default_cross_engine_flag")]
    pub cross_engine_flag: String,
    /// Flag carrying the thread count.
    #[serde(default = "default_threads_flag")]
    pub threads_flag: String,
    /// Trailing mode keyword.
    #[serde(default = "default_driver_mode")]
    pub mode: String,
    /// Option name to driver flag overrides, merged over the defaults.
    #[serde(default)]
    pub flags: BTreeMap<String, String>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            program: default_driver_program(),
            alternate_program: None,
            affinity_program: default_affinity_program(),
            base_args: default_base_args(),
            ignore_errors_flag: default_ignore_errors_flag(),
            socket_flag: default_socket_flag(),
            cross_engine_flag: default_cross_engine_flag(),
            threads_flag: default_threads_flag(),
            mode: default_driver_mode(),
            flags: BTreeMap::new(),
        }
    }
}

/// `[notify]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotifyConfig {
    /// Enables endpoint delivery.
    #[serde(default)]
    pub enabled: bool,
    /// Messaging endpoint URL.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Environment variable holding the endpoint URL.
    #[serde(default)]
    pub endpoint_env: Option<String>,
    /// Chat identifier sent with every message.
    #[serde(default)]
    pub chat_id: Option<String>,
    /// Message markup mode.
    #[serde(default = "default_parse_mode")]
    pub parse_mode: String,
    /// Per-request timeout.
    #[serde(default = "default_notify_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            endpoint_env: None,
            chat_id: None,
            parse_mode: default_parse_mode(),
            timeout_ms: default_notify_timeout_ms(),
        }
    }
}

impl NotifyConfig {
    /// Resolves the endpoint URL, reading `endpoint_env` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the variable is unset or the
    /// URL is not http(s).
    pub fn resolve_endpoint(&self) -> Result<String, ConfigError> {
        let endpoint = match (&self.endpoint, &self.endpoint_env) {
            (Some(endpoint), None) => endpoint.clone(),
            (None, Some(var)) => env::var(var).map_err(|_| {
                ConfigError::Invalid(format!("notify.endpoint_env variable {var} is not set"))
            })?,
            _ => {
                return Err(ConfigError::Invalid(
                    "notify requires exactly one of endpoint or endpoint_env".to_string(),
                ));
            }
        };
        validate_endpoint(&endpoint)?;
        Ok(endpoint)
    }

    /// Returns the request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validates notification configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_NOTIFY_TIMEOUT_MS ..= MAX_NOTIFY_TIMEOUT_MS).contains(&self.timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "notify.timeout_ms must be between {MIN_NOTIFY_TIMEOUT_MS} and \
                 {MAX_NOTIFY_TIMEOUT_MS}"
            )));
        }
        if !self.enabled {
            return Ok(());
        }
        match (&self.endpoint, &self.endpoint_env) {
            (Some(endpoint), None) => validate_endpoint(endpoint)?,
            (None, Some(var)) => require_non_empty("notify.endpoint_env", var)?,
            _ => {
                return Err(ConfigError::Invalid(
                    "notify requires exactly one of endpoint or endpoint_env".to_string(),
                ));
            }
        }
        match &self.chat_id {
            Some(chat_id) => require_non_empty("notify.chat_id", chat_id)?,
            None => {
                return Err(ConfigError::Invalid(
                    "notify.chat_id is required when notify.enabled=true".to_string(),
                ));
            }
        }
        require_non_empty("notify.parse_mode", &self.parse_mode)
    }
}

// ============================================================================
// SECTION: Loading and Validation
// ============================================================================

impl SweepConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", resolved.display())))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config = Self::from_toml(content)?;
        Ok(config)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_name("name", &self.name)?;
        self.validate_system()?;
        self.validate_server()?;
        self.validate_prepare()?;
        self.validate_restart()?;
        self.validate_driver()?;
        self.notify.validate()?;
        if self.benchmarks.is_empty() {
            return Err(ConfigError::Invalid("at least one [[benchmark]] is required".to_string()));
        }
        let mut ids = BTreeSet::new();
        for benchmark in &self.benchmarks {
            benchmark.validate(self.prepare.engine_probe_index)?;
            if !ids.insert(benchmark.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "benchmark id {} is declared more than once",
                    benchmark.id
                )));
            }
        }
        Ok(())
    }

    /// Validates the `[system]` section.
    fn validate_system(&self) -> Result<(), ConfigError> {
        let system = &self.system;
        if let Some(cpuset) = &system.cpuset {
            require_non_empty("system.cpuset", cpuset)?;
        }
        for code in &system.ignore_errors {
            require_non_empty("system.ignore_errors entries", code)?;
            if code.contains(',') {
                return Err(ConfigError::Invalid(
                    "system.ignore_errors entries must not contain ','".to_string(),
                ));
            }
        }
        validate_path_string("system.socket", &system.socket)?;
        validate_path_string("system.cwd", &system.cwd)?;
        validate_path_string("system.log_dir", &system.log_dir)?;
        for file in &system.stage_files {
            validate_path_string("system.stage_files", file)?;
        }
        Ok(())
    }

    /// Validates the `[server]` section.
    fn validate_server(&self) -> Result<(), ConfigError> {
        let server = &self.server;
        require_non_empty("server.process_name", &server.process_name)?;
        validate_path_string("server.binary", &server.binary)?;
        validate_path_string("server.storage_dir", &server.storage_dir)?;
        if Path::new(server.storage_dir.trim())
            .components()
            .all(|component| matches!(component, Component::RootDir | Component::CurDir))
        {
            return Err(ConfigError::Invalid(
                "server.storage_dir must name a dedicated directory".to_string(),
            ));
        }
        require_non_empty("server.start_script", &server.start_script)?;
        if !(1 ..= MAX_READINESS_TIMEOUT_SECS).contains(&server.readiness_timeout_secs) {
            return Err(ConfigError::Invalid(format!(
                "server.readiness_timeout_secs must be between 1 and {MAX_READINESS_TIMEOUT_SECS}"
            )));
        }
        if !(1 ..= MAX_POLL_INTERVAL_MS).contains(&server.poll_interval_ms) {
            return Err(ConfigError::Invalid(format!(
                "server.poll_interval_ms must be between 1 and {MAX_POLL_INTERVAL_MS}"
            )));
        }
        if server.shutdown_timeout_ms > MAX_SHUTDOWN_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "server.shutdown_timeout_ms must be <= {MAX_SHUTDOWN_TIMEOUT_MS}"
            )));
        }
        if let Some(log_file) = &server.log_file {
            validate_path_string("server.log_file", log_file)?;
        }
        Ok(())
    }

    /// Validates the `[prepare]` section.
    fn validate_prepare(&self) -> Result<(), ConfigError> {
        let prepare = &self.prepare;
        require_non_empty("prepare.script", &prepare.script)?;
        if let Some(alternate) = &prepare.alternate_script {
            require_non_empty("prepare.alternate_script", alternate)?;
        }
        if prepare.creator_threads == 0 {
            return Err(ConfigError::Invalid("prepare.creator_threads must be > 0".to_string()));
        }
        if prepare.table_count == 0 || prepare.table_size == 0 {
            return Err(ConfigError::Invalid(
                "prepare.table_count and prepare.table_size must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Validates the `[restart]` section.
    fn validate_restart(&self) -> Result<(), ConfigError> {
        let restart = &self.restart;
        if restart.max_attempts == Some(0) {
            return Err(ConfigError::Invalid("restart.max_attempts must be > 0".to_string()));
        }
        if restart.max_backoff_ms > MAX_BACKOFF_MS {
            return Err(ConfigError::Invalid(format!(
                "restart.max_backoff_ms must be <= {MAX_BACKOFF_MS}"
            )));
        }
        if restart.initial_backoff_ms > restart.max_backoff_ms {
            return Err(ConfigError::Invalid(
                "restart.initial_backoff_ms must be <= restart.max_backoff_ms".to_string(),
            ));
        }
        Ok(())
    }

    /// Validates the `[driver]` section.
    fn validate_driver(&self) -> Result<(), ConfigError> {
        let driver = &self.driver;
        for (field, value) in [
            ("driver.program", &driver.program),
            ("driver.affinity_program", &driver.affinity_program),
            ("driver.ignore_errors_flag", &driver.ignore_errors_flag),
            ("driver.socket_flag", &driver.socket_flag),
            ("driver.cross_engine_flag", &driver.cross_engine_flag),
            ("driver.threads_flag", &driver.threads_flag),
            ("driver.mode", &driver.mode),
        ] {
            require_non_empty(field, value)?;
        }
        if let Some(alternate) = &driver.alternate_program {
            require_non_empty("driver.alternate_program", alternate)?;
        }
        for (name, flag) in &driver.flags {
            require_non_empty("driver.flags keys", name)?;
            require_non_empty("driver.flags values", flag)?;
        }
        Ok(())
    }

    // ========================================================================
    // SECTION: Conversion
    // ========================================================================

    /// Builds the sweep description.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a benchmark entry cannot be converted.
    pub fn sweep_description(&self) -> Result<SweepDescription, ConfigError> {
        let defaults = TableLayout {
            count: self.prepare.table_count,
            size: self.prepare.table_size,
        };
        let items = self
            .benchmarks
            .iter()
            .map(|benchmark| benchmark.to_item(defaults))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SweepDescription {
            name: self.name.clone(),
            items,
        })
    }

    /// Builds the static configuration shared by every run.
    #[must_use]
    pub fn static_config(&self) -> StaticConfig {
        let cwd = PathBuf::from(self.system.cwd.trim());
        let log_dir = PathBuf::from(self.system.log_dir.trim());
        let log_dir = if log_dir.is_relative() { cwd.join(log_dir) } else { log_dir };
        let mut flags = default_driver_flags();
        flags.extend(self.driver.flags.iter().map(|(name, flag)| (name.clone(), flag.clone())));

        StaticConfig {
            environment: EnvironmentSettings {
                cpuset: self.system.cpuset.as_ref().map(|cpuset| cpuset.trim().to_string()),
                ignore_errors: self.system.ignore_errors.clone(),
                socket: PathBuf::from(self.system.socket.trim()),
                cwd,
                log_dir,
                stage_files: self.system.stage_files.iter().map(PathBuf::from).collect(),
            },
            server: ServerSettings {
                process_name: self.server.process_name.clone(),
                binary: PathBuf::from(self.server.binary.trim()),
                init_args: self.server.init_args.clone(),
                storage_dir: PathBuf::from(self.server.storage_dir.trim()),
                start_script: self.server.start_script.clone(),
                readiness_timeout: Duration::from_secs(self.server.readiness_timeout_secs),
                readiness_mode: self.server.readiness_mode,
                poll_interval: Duration::from_millis(self.server.poll_interval_ms),
                shutdown_timeout: Duration::from_millis(self.server.shutdown_timeout_ms),
                post_ready_delay: Duration::from_millis(self.server.post_ready_delay_ms),
                log_file: self.server.log_file.as_ref().map(PathBuf::from),
            },
            prepare: PrepareSettings {
                script: self.prepare.script.clone(),
                alternate_script: self.prepare.alternate_script.clone(),
                engine_probe_index: self.prepare.engine_probe_index,
                creator_threads: self.prepare.creator_threads,
            },
            restart: RestartPolicy {
                max_attempts: self.restart.max_attempts,
                initial_backoff: Duration::from_millis(self.restart.initial_backoff_ms),
                max_backoff: Duration::from_millis(self.restart.max_backoff_ms),
            },
            driver: DriverSettings {
                program: self.driver.program.clone(),
                alternate_program: self.driver.alternate_program.clone(),
                affinity_program: self.driver.affinity_program.clone(),
                base_args: self.driver.base_args.clone(),
                ignore_errors_flag: self.driver.ignore_errors_flag.clone(),
                socket_flag: self.driver.socket_flag.clone(),
                cross_engine_flag: self.driver.cross_engine_flag.clone(),
                threads_flag: self.driver.threads_flag.clone(),
                mode: self.driver.mode.clone(),
                flags,
            },
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
pub(crate) fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a name used as a single file name component.
pub(crate) fn validate_name(field: &str, value: &str) -> Result<(), ConfigError> {
    require_non_empty(field, value)?;
    if value.len() > MAX_PATH_COMPONENT_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    if value.contains(['/', '\\']) || value == "." || value == ".." {
        return Err(ConfigError::Invalid(format!("{field} must be a plain name: {value}")));
    }
    Ok(())
}

/// Rejects empty or whitespace-only strings.
pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    Ok(())
}

/// Accepts only http(s) endpoint URLs.
fn validate_endpoint(endpoint: &str) -> Result<(), ConfigError> {
    let trimmed = endpoint.trim();
    let rest = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .ok_or_else(|| ConfigError::Invalid("notify.endpoint must be an http(s) URL".to_string()))?;
    if rest.is_empty() || rest.starts_with('/') {
        return Err(ConfigError::Invalid("notify.endpoint must name a host".to_string()));
    }
    Ok(())
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default working directory.
fn default_cwd() -> String {
    ".".to_string()
}

/// Default log root.
fn default_log_dir() -> String {
    "logs".to_string()
}

/// Default server process name.
fn default_process_name() -> String {
    "mysqld".to_string()
}

/// Default storage initialization arguments.
fn default_init_args() -> Vec<String> {
    vec!["--initialize".to_string()]
}

/// Default start script.
fn default_start_script() -> String {
    "./start_mysqld.sh".to_string()
}

/// Default readiness timeout.
const fn default_readiness_timeout_secs() -> u64 {
    180
}

/// Default poll interval.
const fn default_poll_interval_ms() -> u64 {
    200
}

/// Default shutdown wait.
const fn default_shutdown_timeout_ms() -> u64 {
    30_000
}

/// Default preparation script.
fn default_prepare_script() -> String {
    "./prepare_tables.sh".to_string()
}

/// Default table creation threads.
const fn default_creator_threads() -> u32 {
    64
}

/// Default table count.
const fn default_table_count() -> u64 {
    1
}

/// Default table size.
const fn default_table_size() -> u64 {
    10_000
}

/// Default initial restart backoff.
const fn default_initial_backoff_ms() -> u64 {
    1_000
}

/// Default restart backoff cap.
const fn default_max_backoff_ms() -> u64 {
    60_000
}

/// Default driver program.
fn default_driver_program() -> String {
    "sysbench".to_string()
}

/// Default affinity launcher.
fn default_affinity_program() -> String {
    "taskset".to_string()
}

/// Default fixed driver arguments.
fn default_base_args() -> Vec<String> {
    ["--mysql_storage_engine=ERMIA", "--create-secondary=off", "--db-driver=mysql", "--range_selects=off"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Default ignored-errors flag.
fn default_ignore_errors_flag() -> String {
    "--mysql-ignore-errors".to_string()
}

/// Default socket flag.
fn default_socket_flag() -> String {
    "--mysql-socket".to_string()
}

/// Default cross-engine percentage flag.
fn default_cross_engine_flag() -> String {
    "--innodb_percentage".to_string()
}

/// Default thread count flag.
fn default_threads_flag() -> String {
    "--threads".to_string()
}

/// Default driver mode.
fn default_driver_mode() -> String {
    "run".to_string()
}

/// Default notification markup mode.
fn default_parse_mode() -> String {
    "markdown".to_string()
}

/// Default notification timeout.
const fn default_notify_timeout_ms() -> u64 {
    5_000
}

// ============================================================================
// SECTION: Tests
// ============================================================================
