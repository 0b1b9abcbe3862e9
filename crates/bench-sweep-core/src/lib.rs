// crates/bench-sweep-core/src/lib.rs
// ============================================================================
// Module: Bench Sweep Core Library
// Description: Public API surface for the sweep orchestrator core.
// Purpose: Expose sweep types, interfaces, and runtime components.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Bench sweep core drives repeatable benchmark experiments against a single
//! external database server. A declarative [`SweepDescription`] is expanded
//! into an ordered sequence of [`RunSpec`] values, and each run is executed in
//! isolation: clean restart, readiness wait, table preparation, captured
//! benchmark rounds, and teardown. External processes, readiness signals, and
//! notifications are reached only through the traits in [`interfaces`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::CommandStatus;
pub use interfaces::DriverOutput;
pub use interfaces::LogEvent;
pub use interfaces::LogLevel;
pub use interfaces::Notifier;
pub use interfaces::PrepareRequest;
pub use interfaces::ProcessController;
pub use interfaces::ProcessError;
pub use interfaces::ReadinessError;
pub use interfaces::ReadinessWatcher;
pub use interfaces::SweepLog;
pub use runtime::CancelFlag;
pub use runtime::CommandBuilder;
pub use runtime::EventReadinessWatcher;
pub use runtime::FileSweepLog;
pub use runtime::NoopSweepLog;
pub use runtime::PollingReadinessWatcher;
pub use runtime::RunError;
pub use runtime::RunExecutor;
pub use runtime::SUMMARY_FILE_NAME;
pub use runtime::StderrSweepLog;
pub use runtime::SweepDriver;
pub use runtime::SweepError;
pub use runtime::SystemProcessController;
pub use runtime::display_command;
pub use runtime::expand;
pub use runtime::prepare_sweep_dir;
pub use runtime::select_watcher;
pub use runtime::stage_files;
