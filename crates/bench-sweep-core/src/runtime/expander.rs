// crates/bench-sweep-core/src/runtime/expander.rs
// ============================================================================
// Module: Run Spec Expander
// Description: Expands a sweep description into ordered run specs.
// Purpose: Produce a predictable, lazily generated run sequence.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Items are visited in description order. Within an item the nesting is
//! fixed: engine mapping outermost, then thread count, then transaction
//! selector, then cross-engine percentage innermost. Pairing-filtered
//! combinations are dropped before indices are assigned, so run indices are
//! dense and stable for a given description; operators resume a partial
//! sweep by narrowing the description, not by seeking into the sequence.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::BenchmarkItem;
use crate::core::EngineMapping;
use crate::core::RunDimensions;
use crate::core::RunSpec;
use crate::core::SweepDescription;
use crate::core::SweepTimestamp;

// ============================================================================
// SECTION: Expansion
// ============================================================================

/// Expands `description` into run specs stamped with `started_at`.
///
/// The sequence is finite, deterministic for identical inputs, and lazy.
pub fn expand(
    description: &SweepDescription,
    started_at: SweepTimestamp,
) -> impl Iterator<Item = RunSpec> + '_ {
    description
        .items
        .iter()
        .flat_map(|item| item_points(item).map(move |dimensions| (item, dimensions)))
        .enumerate()
        .map(move |(index, (item, dimensions))| RunSpec {
            index,
            run_id: dimensions.run_id(started_at),
            sweep_name: description.name.clone(),
            dimensions,
            bench_script: item.bench_script.clone(),
            rounds: item.rounds,
            server_args: item.server_args.clone(),
            tables: item.tables,
            options: item.options.clone(),
        })
}

/// Walks one item's dimension product in nesting order, applying pairings.
fn item_points(item: &BenchmarkItem) -> impl Iterator<Item = RunDimensions> + '_ {
    let mappings: Vec<Option<&EngineMapping>> =
        item.mappings.as_ref().map_or_else(|| vec![None], |list| list.iter().map(Some).collect());
    let txns: Vec<Option<i64>> =
        item.txns.as_ref().map_or_else(|| vec![None], |list| list.iter().copied().map(Some).collect());

    mappings
        .into_iter()
        .flat_map(move |mapping| {
            let txns = txns.clone();
            item.threads.iter().flat_map(move |&threads| {
                txns.clone().into_iter().flat_map(move |txn| {
                    item.cross_engine_percentages
                        .iter()
                        .map(move |&pct| (mapping, threads, txn, pct))
                })
            })
        })
        .filter(|(mapping, _, txn, _)| item.allows(*mapping, *txn))
        .map(|(mapping, threads, txn, cross_engine_pct)| RunDimensions {
            item_id: item.id.clone(),
            mapping: mapping.cloned(),
            threads,
            txn,
            cross_engine_pct,
        })
}
