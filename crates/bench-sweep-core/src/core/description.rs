// crates/bench-sweep-core/src/core/description.rs
// ============================================================================
// Module: Sweep Description
// Description: Declarative sweep input: benchmark items and their dimensions.
// Purpose: Hold the operator-supplied matrix that the expander walks.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A sweep is an ordered list of benchmark items. Each item carries the
//! dimension lists (engine mappings, thread counts, transaction selectors,
//! cross-engine percentages) whose Cartesian product, minus pairing-filtered
//! combinations, defines the item's runs. Optional dimensions (`mappings`,
//! `txns`) are `None` when the item does not vary them; they then contribute
//! a single absent value to the product.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::EngineMapping;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Operator-supplied sweep description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepDescription {
    /// Human-readable sweep name; also names the sweep log directory.
    pub name: String,
    /// Benchmark items in run order.
    pub items: Vec<BenchmarkItem>,
}

/// Table layout handed to the table-preparation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableLayout {
    /// Number of tables to create.
    pub count: u64,
    /// Rows (or scale factor) per table.
    pub size: u64,
}

/// Restricts which engine mappings a transaction selector may run with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingRule {
    /// Transaction selector the rule applies to.
    pub txn: i64,
    /// Engine mappings allowed for that selector.
    pub mappings: Vec<EngineMapping>,
}

/// One benchmark item and its dimension lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkItem {
    /// Item identifier, unique within the sweep.
    pub id: String,
    /// Benchmark script passed to the driver.
    pub bench_script: String,
    /// Engine mappings to sweep, when the item varies them.
    pub mappings: Option<Vec<EngineMapping>>,
    /// Connection/thread counts to sweep.
    pub threads: Vec<u32>,
    /// Transaction selectors to sweep, when the item varies them.
    pub txns: Option<Vec<i64>>,
    /// Cross-engine traffic percentages to sweep.
    pub cross_engine_percentages: Vec<u8>,
    /// Rounds executed per run.
    pub rounds: u32,
    /// Mapping/selector pairing filters.
    pub pairings: Vec<PairingRule>,
    /// Extra arguments for the server start step.
    pub server_args: Vec<String>,
    /// Table layout for the preparation step.
    pub tables: TableLayout,
    /// Remaining item fields, rendered as strings for driver flag mapping.
    pub options: BTreeMap<String, String>,
}

// ============================================================================
// SECTION: Behavior
// ============================================================================

impl SweepDescription {
    /// Returns a copy restricted to the named items, preserving order.
    ///
    /// An empty `item_ids` slice keeps every item.
    #[must_use]
    pub fn narrowed(&self, item_ids: &[String]) -> Self {
        if item_ids.is_empty() {
            return self.clone();
        }
        Self {
            name: self.name.clone(),
            items: self
                .items
                .iter()
                .filter(|item| item_ids.iter().any(|id| id == &item.id))
                .cloned()
                .collect(),
        }
    }
}

impl BenchmarkItem {
    /// Returns true when the pairing rules admit this mapping/selector pair.
    ///
    /// A pair is admitted when no rule names the selector, or when some rule
    /// naming the selector lists the mapping.
    #[must_use]
    pub fn allows(&self, mapping: Option<&EngineMapping>, txn: Option<i64>) -> bool {
        let Some(txn) = txn else {
            return true;
        };
        let mut rules = self.pairings.iter().filter(|rule| rule.txn == txn).peekable();
        if rules.peek().is_none() {
            return true;
        }
        let Some(mapping) = mapping else {
            return false;
        };
        rules.any(|rule| rule.mappings.contains(mapping))
    }

    /// Number of points in the unfiltered dimension product.
    #[must_use]
    pub fn product_len(&self) -> usize {
        let mappings = self.mappings.as_ref().map_or(1, Vec::len);
        let txns = self.txns.as_ref().map_or(1, Vec::len);
        mappings * self.threads.len() * txns * self.cross_engine_percentages.len()
    }
}
