// crates/bench-sweep-core/src/runtime/mod.rs
// ============================================================================
// Module: Bench Sweep Runtime
// Description: Expansion, command building, run execution, and sweep driving.
// Purpose: Execute a sweep description against the host through interfaces.
// Dependencies: crate::{core, interfaces}, notify, serde_json, time
// ============================================================================

//! ## Overview
//! Runtime modules implement the sweep: the expander turns a description into
//! run specs, the executor walks each run through restart, readiness,
//! preparation, rounds, and teardown, and the driver sequences runs and
//! reports outcomes. Runs execute strictly one at a time because each run
//! owns the single server instance and its storage.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod cancel;
pub mod command;
pub mod driver;
pub mod executor;
pub mod expander;
pub mod log;
pub mod process;
pub mod readiness;
pub mod workspace;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cancel::CancelFlag;
pub use command::CommandBuilder;
pub use command::display_command;
pub use driver::SUMMARY_FILE_NAME;
pub use driver::SweepDriver;
pub use executor::RunError;
pub use executor::RunExecutor;
pub use expander::expand;
pub use log::FileSweepLog;
pub use log::NoopSweepLog;
pub use log::StderrSweepLog;
pub use process::SystemProcessController;
pub use readiness::EventReadinessWatcher;
pub use readiness::PollingReadinessWatcher;
pub use readiness::select_watcher;
pub use workspace::SweepError;
pub use workspace::prepare_sweep_dir;
pub use workspace::stage_files;
