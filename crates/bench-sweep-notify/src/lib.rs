// crates/bench-sweep-notify/src/lib.rs
// ============================================================================
// Module: Bench Sweep Notify Library
// Description: Notifier implementations for run and sweep outcomes.
// Purpose: Deliver outcome messages without ever failing the sweep.
// Dependencies: bench-sweep-core, reqwest
// ============================================================================

//! ## Overview
//! Notifiers receive [`bench_sweep_core::SweepEvent`] values from the sweep
//! driver. Delivery is best effort: failures are logged and swallowed so a
//! flaky messaging endpoint never aborts a sweep.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod fanout;
pub mod http;
pub mod log;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use fanout::FanoutNotifier;
pub use http::HttpNotifier;
pub use http::HttpNotifierConfig;
pub use http::NotifyError;
pub use log::LogNotifier;
