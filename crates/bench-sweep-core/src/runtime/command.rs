// crates/bench-sweep-core/src/runtime/command.rs
// ============================================================================
// Module: Driver Command Builder
// Description: Renders the benchmark driver argument vector for a run.
// Purpose: Keep driver invocations pure and byte-stable per run spec.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! The argument vector is a pure function of the static configuration and the
//! run spec. Layout: optional affinity prefix, driver program (the alternate
//! program when the run's mapping selects the alternate engine), bench script,
//! ignored error codes, socket, fixed base arguments, mapped per-item options
//! in name order, the engine mapping and transaction selector when present,
//! then the cross-engine percentage, thread count, and driver mode.
//! Option names with no driver flag mapping are dropped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::EngineVariant;
use crate::core::RunSpec;
use crate::core::StaticConfig;
use crate::core::settings::ENGINE_MAPPING_OPTION;
use crate::core::settings::TXN_OPTION;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Separator for the ignored error code list.
const IGNORE_ERRORS_DELIMITER: &str = ",";

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builds driver argument vectors from static configuration.
#[derive(Debug, Clone, Copy)]
pub struct CommandBuilder<'a> {
    /// Static configuration shared by every run.
    config: &'a StaticConfig,
}

impl<'a> CommandBuilder<'a> {
    /// Creates a builder over `config`.
    #[must_use]
    pub const fn new(config: &'a StaticConfig) -> Self {
        Self {
            config,
        }
    }

    /// Renders the driver argument vector for `spec`.
    #[must_use]
    pub fn build(&self, spec: &RunSpec) -> Vec<String> {
        let environment = &self.config.environment;
        let driver = &self.config.driver;
        let mut argv = Vec::new();

        if let Some(cpuset) = &environment.cpuset {
            argv.push(driver.affinity_program.clone());
            argv.push("-c".to_string());
            argv.push(cpuset.clone());
        }
        let program = match self.config.engine_variant(spec.dimensions.mapping.as_ref()) {
            EngineVariant::Alternate => driver.alternate_program.as_ref().unwrap_or(&driver.program),
            EngineVariant::Primary => &driver.program,
        };
        argv.push(program.clone());
        argv.push(spec.bench_script.clone());
        if !environment.ignore_errors.is_empty() {
            argv.push(format!(
                "{}={}",
                driver.ignore_errors_flag,
                environment.ignore_errors.join(IGNORE_ERRORS_DELIMITER)
            ));
        }
        argv.push(format!("{}={}", driver.socket_flag, environment.socket.display()));
        argv.extend(driver.base_args.iter().cloned());

        for (name, value) in &spec.options {
            if let Some(flag) = driver.flags.get(name) {
                argv.push(format!("{flag}={value}"));
            }
        }
        if let Some(mapping) = &spec.dimensions.mapping
            && let Some(flag) = driver.flags.get(ENGINE_MAPPING_OPTION)
        {
            argv.push(format!("{flag}={mapping}"));
        }
        if let Some(txn) = spec.dimensions.txn
            && let Some(flag) = driver.flags.get(TXN_OPTION)
        {
            argv.push(format!("{flag}={txn}"));
        }

        argv.push(format!("{}={}", driver.cross_engine_flag, spec.dimensions.cross_engine_pct));
        argv.push(format!("{}={}", driver.threads_flag, spec.dimensions.threads));
        argv.push(driver.mode.clone());
        argv
    }
}

/// Renders an argument vector as the single line recorded in run logs.
#[must_use]
pub fn display_command(argv: &[String]) -> String {
    argv.join(" ")
}
