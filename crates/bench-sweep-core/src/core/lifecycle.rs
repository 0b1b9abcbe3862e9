// crates/bench-sweep-core/src/core/lifecycle.rs
// ============================================================================
// Module: Server Lifecycle
// Description: Conceptual server states and the permitted transitions.
// Purpose: Fail loudly when a run skips a lifecycle step.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A run must walk Killed → Initializing → Initialized → Starting → Ready →
//! `TablesPrepared` before Running. Killed is reachable from every state
//! (restart and teardown). Any other transition is an executor fault.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Types
// ============================================================================

/// State the orchestrator assumes the external server occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerLifecycleState {
    /// Nothing known about the server.
    #[default]
    Unknown,
    /// Every matching process has been terminated.
    Killed,
    /// Storage wipe and initialization in progress.
    Initializing,
    /// Storage initialized.
    Initialized,
    /// Start issued; readiness not yet observed.
    Starting,
    /// Readiness file observed.
    Ready,
    /// Benchmark tables created.
    TablesPrepared,
    /// Benchmark driver rounds in progress.
    Running,
    /// Rounds finished.
    Stopped,
}

impl ServerLifecycleState {
    /// Returns a stable label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Killed => "killed",
            Self::Initializing => "initializing",
            Self::Initialized => "initialized",
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::TablesPrepared => "tables_prepared",
            Self::Running => "running",
            Self::Stopped => "stopped",
        }
    }

    /// Returns true when `next` may follow `self`.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (_, Self::Killed)
                | (Self::Killed, Self::Initializing)
                | (Self::Initializing, Self::Initialized)
                | (Self::Initialized, Self::Starting)
                | (Self::Starting, Self::Ready)
                | (Self::Ready, Self::TablesPrepared)
                | (Self::TablesPrepared, Self::Running)
                | (Self::Running, Self::Stopped)
        )
    }
}

impl fmt::Display for ServerLifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Illegal lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal server lifecycle transition {from} -> {to}")]
pub struct LifecycleError {
    /// State before the attempted transition.
    pub from: ServerLifecycleState,
    /// Requested state.
    pub to: ServerLifecycleState,
}

/// Tracks the assumed server state for one run.
#[derive(Debug, Clone, Default)]
pub struct LifecycleTracker {
    /// Current state.
    state: ServerLifecycleState,
}

impl LifecycleTracker {
    /// Creates a tracker in the [`ServerLifecycleState::Unknown`] state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> ServerLifecycleState {
        self.state
    }

    /// Moves to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError`] when the transition is not permitted.
    pub fn advance(&mut self, next: ServerLifecycleState) -> Result<(), LifecycleError> {
        if !self.state.can_advance_to(next) {
            return Err(LifecycleError {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
