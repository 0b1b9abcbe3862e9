// crates/bench-sweep-core/src/core/mod.rs
// ============================================================================
// Module: Bench Sweep Core Types
// Description: Sweep descriptions, run specs, outcomes, and lifecycle states.
// Purpose: Define the data model shared by the expander, executor, and driver.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Core types are plain data. A [`SweepDescription`] is immutable once
//! expansion begins, [`RunSpec`] values are read-only after the expander
//! creates them, and [`RunOutcome`] values are never mutated after the
//! executor returns them.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod description;
pub mod events;
pub mod identifiers;
pub mod lifecycle;
pub mod outcome;
pub mod settings;
pub mod spec;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use description::BenchmarkItem;
pub use description::PairingRule;
pub use description::SweepDescription;
pub use description::TableLayout;
pub use events::SweepEvent;
pub use events::render_message;
pub use identifiers::EngineMapping;
pub use identifiers::EngineVariant;
pub use identifiers::MappingError;
pub use identifiers::RunId;
pub use identifiers::SweepTimestamp;
pub use lifecycle::LifecycleError;
pub use lifecycle::LifecycleTracker;
pub use lifecycle::ServerLifecycleState;
pub use outcome::RunClassification;
pub use outcome::RunOutcome;
pub use outcome::SweepSummary;
pub use settings::DriverSettings;
pub use settings::EnvironmentSettings;
pub use settings::PrepareSettings;
pub use settings::ReadinessMode;
pub use settings::RestartPolicy;
pub use settings::ServerSettings;
pub use settings::StaticConfig;
pub use spec::RunDimensions;
pub use spec::RunSpec;
