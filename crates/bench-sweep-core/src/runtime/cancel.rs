// crates/bench-sweep-core/src/runtime/cancel.rs
// ============================================================================
// Module: Sweep Cancellation Flag
// Description: Shared flag set by the operator's termination handler.
// Purpose: Stop the sweep between runs after an interrupt.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The termination handler kills in-flight children and sets this flag; the
//! sweep loop and the restart retry loop observe it and wind down, so the
//! final notification is still sent.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

/// Cloneable cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates an unset flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the sweep as cancelled.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true once [`CancelFlag::cancel`] has been called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
