// crates/bench-sweep-notify/src/fanout.rs
// ============================================================================
// Module: Fan-Out Notifier
// Description: Delivers each event to several notifiers in order.
// Purpose: Combine the log trail with an optional endpoint.
// Dependencies: bench-sweep-core
// ============================================================================

//! ## Overview
//! Members are invoked in insertion order; since notifiers never fail,
//! every member sees every event.

// ============================================================================
// SECTION: Imports
// ============================================================================

use bench_sweep_core::Notifier;
use bench_sweep_core::SweepEvent;

// ============================================================================
// SECTION: Notifier
// ============================================================================

/// Notifier forwarding to a list of members.
#[derive(Default)]
pub struct FanoutNotifier {
    /// Member notifiers.
    members: Vec<Box<dyn Notifier + Send + Sync>>,
}

impl FanoutNotifier {
    /// Creates an empty fan-out.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a member notifier.
    #[must_use]
    pub fn with(mut self, notifier: impl Notifier + Send + Sync + 'static) -> Self {
        self.members.push(Box::new(notifier));
        self
    }

    /// Returns the number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns true when no member is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl Notifier for FanoutNotifier {
    fn notify(&self, event: &SweepEvent<'_>) {
        for member in &self.members {
            member.notify(event);
        }
    }
}
