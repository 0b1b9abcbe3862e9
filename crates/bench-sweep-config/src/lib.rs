// crates/bench-sweep-config/src/lib.rs
// ============================================================================
// Module: Bench Sweep Config Library
// Description: Sweep description file model, validation, and conversion.
// Purpose: Single source of truth for bench-sweep.toml semantics.
// Dependencies: bench-sweep-core, serde, toml
// ============================================================================

//! ## Overview
//! `bench-sweep-config` loads the sweep description file, validates it
//! strictly (fail closed, before any run starts), and converts it into the
//! core [`bench_sweep_core::SweepDescription`] and
//! [`bench_sweep_core::StaticConfig`] values.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod benchmark;
pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use benchmark::BenchmarkConfig;
pub use benchmark::OneOrMany;
pub use benchmark::PairingConfig;
pub use config::*;
