// crates/bench-sweep-cli/src/lib.rs
// ============================================================================
// Module: Bench Sweep CLI Library
// Description: Shared helpers for the `bench-sweep` binary.
// Purpose: Expose the message catalog to the binary and its tests.
// Dependencies: Standard library only.
// ============================================================================

//! ## Overview
//! The binary lives in `main.rs`; this library carries the i18n catalog and
//! the [`t!`] macro so integration tests can exercise them directly.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod i18n;

#[cfg(test)]
mod tests;
