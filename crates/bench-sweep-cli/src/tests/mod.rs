// crates/bench-sweep-cli/src/tests/mod.rs
// ============================================================================
// Module: CLI Library Unit Tests
// Description: Unit test modules for CLI library helpers.
// ============================================================================

//! ## Overview
//! Groups unit tests that need crate-private access.
