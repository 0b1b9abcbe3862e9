// crates/bench-sweep-cli/src/main.rs
// ============================================================================
// Module: Bench Sweep CLI Entry Point
// Description: Command dispatcher for sweep execution and planning.
// Purpose: Provide a localized CLI around the sweep orchestrator.
// Dependencies: bench-sweep-config, bench-sweep-core, bench-sweep-notify,
// clap, ctrlc, thiserror
// ============================================================================

//! ## Overview
//! `bench-sweep run` loads a sweep description, wires the system process
//! controller, readiness watcher, log sink, and notifiers together, and runs
//! the sweep to completion. `bench-sweep plan` prints the expanded runs and
//! their driver commands without touching the server. Configuration problems
//! are reported before any run starts and yield a non-zero exit code; run
//! failures do not.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use bench_sweep_cli::i18n::Locale;
use bench_sweep_cli::i18n::set_locale;
use bench_sweep_cli::t;
use bench_sweep_config::NotifyConfig;
use bench_sweep_config::SweepConfig;
use bench_sweep_core::CancelFlag;
use bench_sweep_core::CommandBuilder;
use bench_sweep_core::FileSweepLog;
use bench_sweep_core::LogLevel;
use bench_sweep_core::ProcessController;
use bench_sweep_core::RunExecutor;
use bench_sweep_core::StderrSweepLog;
use bench_sweep_core::SweepDescription;
use bench_sweep_core::SweepDriver;
use bench_sweep_core::SweepLog;
use bench_sweep_core::SweepTimestamp;
use bench_sweep_core::SystemProcessController;
use bench_sweep_core::display_command;
use bench_sweep_core::expand;
use bench_sweep_core::select_watcher;
use bench_sweep_notify::FanoutNotifier;
use bench_sweep_notify::HttpNotifier;
use bench_sweep_notify::HttpNotifierConfig;
use bench_sweep_notify::LogNotifier;
use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable selecting the output language.
const LANG_ENV: &str = "BENCH_SWEEP_LANG";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "bench-sweep", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Preferred output language (overrides `BENCH_SWEEP_LANG`).
    #[arg(long, value_enum, value_name = "LANG", global = true)]
    lang: Option<LangArg>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Execute a sweep against the configured server.
    Run(RunCommand),
    /// Print the expanded runs and driver commands without executing them.
    Plan(PlanCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a sweep description file.
    Validate(ConfigValidateCommand),
}

/// Arguments selecting the sweep description and its items.
#[derive(Args, Debug, Clone)]
struct SweepArgs {
    /// Sweep description path (defaults to bench-sweep.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Restrict the sweep to the named benchmark items (repeatable).
    #[arg(long = "item", value_name = "ID")]
    items: Vec<String>,
}

/// Arguments for `run`.
#[derive(Args, Debug)]
struct RunCommand {
    /// Sweep selection.
    #[command(flatten)]
    sweep: SweepArgs,
    /// Minimum level of structured log events.
    #[arg(long, value_enum, default_value_t = LogLevelArg::Info)]
    log_level: LogLevelArg,
    /// Append structured log events to this file instead of stderr.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

/// Arguments for `plan`.
#[derive(Args, Debug)]
struct PlanCommand {
    /// Sweep selection.
    #[command(flatten)]
    sweep: SweepArgs,
}

/// Arguments for config validation.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Sweep description path (defaults to bench-sweep.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Supported CLI language selections.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum LangArg {
    /// English.
    En,
    /// Catalan.
    Ca,
}

/// Log level selections.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum LogLevelArg {
    /// Diagnostic detail, including filesystem events.
    Debug,
    /// Normal progress.
    Info,
    /// Anomalies such as restart retries.
    Warn,
    /// Failures only.
    Error,
}

impl From<LangArg> for Locale {
    fn from(value: LangArg) -> Self {
        match value {
            LangArg::En => Self::En,
            LangArg::Ca => Self::Ca,
        }
    }
}

impl From<LogLevelArg> for LogLevel {
    fn from(value: LogLevelArg) -> Self {
        match value {
            LogLevelArg::Debug => Self::Debug,
            LogLevelArg::Info => Self::Info,
            LogLevelArg::Warn => Self::Warn,
            LogLevelArg::Error => Self::Error,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for localized error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a localized message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let env_lang = std::env::var(LANG_ENV).ok();
    let locale = resolve_locale(cli.lang, env_lang.as_deref())?;
    set_locale(locale);
    if locale != Locale::En {
        write_stderr_line(&t!("i18n.disclaimer.machine_translated"))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Run(command) => command_run(&command),
        Commands::Plan(command) => command_plan(&command),
        Commands::Config {
            command,
        } => command_config(command),
    }
}

/// Prints top-level help.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Executes the `run` command.
fn command_run(command: &RunCommand) -> CliResult<ExitCode> {
    let config = load_config(command.sweep.config.as_deref())?;
    let description = select_items(&config, &command.sweep.items)?;
    let static_config = config.static_config();

    let log = open_log(command.log_file.as_deref(), command.log_level.into())?;
    let controller = Arc::new(SystemProcessController::new(&static_config, Arc::clone(&log)));
    let cancel = CancelFlag::new();
    let watcher = select_watcher(
        static_config.server.readiness_mode,
        static_config.server.poll_interval,
        cancel.clone(),
        Arc::clone(&log),
    );
    let notifier = build_notifier(&config.notify, &log)?;
    install_interrupt_handler(cancel.clone(), Arc::clone(&controller))?;

    let executor = RunExecutor::new(&static_config, controller, watcher, Arc::clone(&log));
    let driver = SweepDriver::new(executor, notifier, log).with_cancel_flag(cancel);
    let summary = driver
        .run(&description)
        .map_err(|err| CliError::new(t!("run.sweep_failed", error = err)))?;

    let sweep_dir = static_config.environment.log_dir.join(&description.name);
    let message = if summary.cancelled {
        t!(
            "run.summary_cancelled",
            name = summary.sweep_name,
            total = summary.total(),
            path = sweep_dir.display()
        )
    } else {
        t!(
            "run.summary",
            name = summary.sweep_name,
            passed = summary.passed(),
            failed = summary.failed(),
            total = summary.total(),
            path = sweep_dir.display()
        )
    };
    write_stdout_line(&message).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Opens the structured log sink.
fn open_log(path: Option<&Path>, level: LogLevel) -> CliResult<Arc<dyn SweepLog>> {
    match path {
        Some(path) => {
            let sink = FileSweepLog::new(path, level).map_err(|err| {
                CliError::new(t!("run.log_file_failed", path = path.display(), error = err))
            })?;
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(StderrSweepLog::new(level))),
    }
}

/// Builds the notifier set: the log trail plus the endpoint when enabled.
fn build_notifier(config: &NotifyConfig, log: &Arc<dyn SweepLog>) -> CliResult<FanoutNotifier> {
    let fanout = FanoutNotifier::new().with(LogNotifier::new(Arc::clone(log)));
    if !config.enabled {
        return Ok(fanout);
    }
    let endpoint = config
        .resolve_endpoint()
        .map_err(|err| CliError::new(t!("run.notify_failed", error = err)))?;
    let mut http_config =
        HttpNotifierConfig::new(endpoint, config.chat_id.clone().unwrap_or_default());
    http_config.parse_mode.clone_from(&config.parse_mode);
    http_config.timeout = config.timeout();
    let notifier = HttpNotifier::new(http_config, Arc::clone(log))
        .map_err(|err| CliError::new(t!("run.notify_failed", error = err)))?;
    Ok(fanout.with(notifier))
}

/// Installs the Ctrl-C handler that cancels the sweep and stops the server.
fn install_interrupt_handler(
    cancel: CancelFlag,
    controller: Arc<SystemProcessController>,
) -> CliResult<()> {
    ctrlc::set_handler(move || {
        cancel.cancel();
        let _ = write_stderr_line(&t!("run.interrupted"));
        controller.terminate_children();
        let _ = controller.kill_all();
    })
    .map_err(|err| CliError::new(t!("run.signal_failed", error = err)))
}

// ============================================================================
// SECTION: Plan Command
// ============================================================================

/// Executes the `plan` command.
fn command_plan(command: &PlanCommand) -> CliResult<ExitCode> {
    let config = load_config(command.sweep.config.as_deref())?;
    let description = select_items(&config, &command.sweep.items)?;
    let static_config = config.static_config();
    let builder = CommandBuilder::new(&static_config);
    let mut count = 0_usize;
    for spec in expand(&description, SweepTimestamp::now()) {
        let line = t!(
            "plan.entry",
            index = spec.index,
            run_id = spec.run_id,
            command = display_command(&builder.build(&spec))
        );
        write_stdout_line(&line).map_err(|err| CliError::new(output_error("stdout", &err)))?;
        count += 1;
    }
    write_stdout_line(&t!("plan.total", count = count))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(&command),
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    config
        .sweep_description()
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;
    write_stdout_line(&t!("config.validate.ok"))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Sweep Helpers
// ============================================================================

/// Loads and validates the sweep description file.
fn load_config(path: Option<&Path>) -> CliResult<SweepConfig> {
    SweepConfig::load(path).map_err(|err| CliError::new(t!("config.load_failed", error = err)))
}

/// Builds the sweep description, narrowed to `items` when any are named.
fn select_items(config: &SweepConfig, items: &[String]) -> CliResult<SweepDescription> {
    let description = config
        .sweep_description()
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;
    let known: BTreeSet<&str> = description.items.iter().map(|item| item.id.as_str()).collect();
    if let Some(unknown) = items.iter().find(|item| !known.contains(item.as_str())) {
        return Err(CliError::new(t!("sweep.item_unknown", item = unknown)));
    }
    Ok(description.narrowed(items))
}

/// Resolves the CLI locale from flags or environment.
fn resolve_locale(lang: Option<LangArg>, env_lang: Option<&str>) -> CliResult<Locale> {
    if let Some(lang) = lang {
        return Ok(lang.into());
    }
    if let Some(value) = env_lang {
        return Locale::parse(value).ok_or_else(|| {
            CliError::new(t!("i18n.lang.invalid_env", env = LANG_ENV, value = value))
        });
    }
    Ok(Locale::En)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats a localized output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
