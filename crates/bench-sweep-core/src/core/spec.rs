// crates/bench-sweep-core/src/core/spec.rs
// ============================================================================
// Module: Run Specification
// Description: One concrete point of a sweep and its derived run identifier.
// Purpose: Carry everything the command builder and executor need per run.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`RunSpec`] is produced by the expander and never mutated. Its run
//! identifier combines the dimension values with the sweep start timestamp:
//! `<item>[-map_<mapping>][-txn_<txn>]-conn_<threads>-inno_<pct>@<secs>.<ms>`.
//! Log post-processing parses the connection count, percentage, and
//! timestamp back out of that name.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Deserialize;
use serde::Serialize;

use crate::core::description::TableLayout;
use crate::core::identifiers::EngineMapping;
use crate::core::identifiers::RunId;
use crate::core::identifiers::SweepTimestamp;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Dimension values identifying one sweep point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunDimensions {
    /// Originating benchmark item.
    pub item_id: String,
    /// Engine mapping, when the item varies it.
    pub mapping: Option<EngineMapping>,
    /// Connection/thread count.
    pub threads: u32,
    /// Transaction selector, when the item varies it.
    pub txn: Option<i64>,
    /// Cross-engine traffic percentage.
    pub cross_engine_pct: u8,
}

/// One concrete run of the sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSpec {
    /// Zero-based position in the expanded sequence.
    pub index: usize,
    /// Deterministic run identifier.
    pub run_id: RunId,
    /// Sweep name the run belongs to.
    pub sweep_name: String,
    /// Dimension values for this run.
    pub dimensions: RunDimensions,
    /// Benchmark script passed to the driver.
    pub bench_script: String,
    /// Rounds executed for this run.
    pub rounds: u32,
    /// Extra server start arguments.
    pub server_args: Vec<String>,
    /// Table layout for preparation.
    pub tables: TableLayout,
    /// Item options eligible for driver flag mapping.
    pub options: BTreeMap<String, String>,
}

// ============================================================================
// SECTION: Behavior
// ============================================================================

impl RunDimensions {
    /// Builds the run identifier for these dimensions at `started_at`.
    #[must_use]
    pub fn run_id(&self, started_at: SweepTimestamp) -> RunId {
        let mut id = self.item_id.clone();
        if let Some(mapping) = &self.mapping {
            let _ = write!(id, "-map_{mapping}");
        }
        if let Some(txn) = self.txn {
            let _ = write!(id, "-txn_{txn}");
        }
        let _ = write!(id, "-conn_{}-inno_{}@{started_at}", self.threads, self.cross_engine_pct);
        RunId::new(id)
    }
}

impl RunSpec {
    /// Returns the per-run log file name.
    #[must_use]
    pub fn log_file_name(&self) -> String {
        format!("{}.log", self.run_id)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use super::*;

    #[test]
    fn run_id_omits_absent_dimensions() {
        let dims = RunDimensions {
            item_id: "oltp".to_string(),
            mapping: None,
            threads: 16,
            txn: None,
            cross_engine_pct: 50,
        };
        let id = dims.run_id(SweepTimestamp::from_unix_millis(1_650_000_000_250));
        assert_eq!(id.as_str(), "oltp-conn_16-inno_50@1650000000.250");
    }

    #[test]
    fn run_id_includes_mapping_and_txn() {
        let dims = RunDimensions {
            item_id: "tpcc".to_string(),
            mapping: Some(EngineMapping::parse("IIEIIIIIE").unwrap()),
            threads: 10,
            txn: Some(-1),
            cross_engine_pct: 0,
        };
        let id = dims.run_id(SweepTimestamp::from_unix_millis(1_000));
        assert_eq!(id.as_str(), "tpcc-map_IIEIIIIIE-txn_-1-conn_10-inno_0@1.000");
    }
}
