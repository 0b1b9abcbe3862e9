// crates/bench-sweep-config/src/benchmark.rs
// ============================================================================
// Module: Benchmark Item Configuration
// Description: `[[benchmark]]` entries and their dimension lists.
// Purpose: Validate one benchmark item and convert it to a core item.
// Dependencies: bench-sweep-core, serde, toml
// ============================================================================

//! ## Overview
//! A `[[benchmark]]` entry names its dimension lists directly. Scalar keys
//! the model does not know are kept as driver options so descriptions can
//! carry workload knobs (`duration`, `random_type`, `db`) without code
//! changes. Legacy key spellings (`connection`, `innodb_percentage`,
//! `nround`) are accepted as aliases.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use bench_sweep_core::BenchmarkItem;
use bench_sweep_core::EngineMapping;
use bench_sweep_core::PairingRule;
use bench_sweep_core::TableLayout;
use bench_sweep_core::core::settings::ENGINE_MAPPING_OPTION;
use bench_sweep_core::core::settings::TXN_OPTION;
use serde::Deserialize;

use crate::config::ConfigError;
use crate::config::require_non_empty;
use crate::config::validate_name;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Largest cross-engine traffic percentage.
const MAX_PERCENTAGE: i64 = 100;
/// Option key receiving the effective table count.
const TABLE_COUNT_OPTION: &str = "table_count";
/// Option key receiving the effective table size.
const TABLE_SIZE_OPTION: &str = "table_size";

// ============================================================================
// SECTION: Types
// ============================================================================

/// A value written either as a scalar or as a list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// Single value.
    One(T),
    /// List of values.
    Many(Vec<T>),
}

impl<T: Clone> OneOrMany<T> {
    /// Returns the values as a list.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        match self {
            Self::One(value) => vec![value.clone()],
            Self::Many(values) => values.clone(),
        }
    }
}

/// `[[benchmark.pairing]]` filter entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PairingConfig {
    /// Transaction selector the rule applies to.
    pub txn: i64,
    /// Engine mappings allowed for the selector.
    pub mappings: Vec<String>,
}

/// `[[benchmark]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct BenchmarkConfig {
    /// Item identifier, unique within the sweep.
    pub id: String,
    /// Benchmark script passed to the driver.
    pub bench_script: String,
    /// Thread counts.
    #[serde(alias = "connection")]
    pub connections: OneOrMany<i64>,
    /// Cross-engine traffic percentages.
    #[serde(alias = "innodb_percentage", default = "default_percentages")]
    pub cross_engine_percentages: OneOrMany<i64>,
    /// Engine mapping strings, when the item varies them.
    #[serde(default)]
    pub mappings: Option<OneOrMany<String>>,
    /// Transaction selectors, when the item varies them.
    #[serde(default)]
    pub txns: Option<OneOrMany<i64>>,
    /// Rounds per run.
    #[serde(alias = "nround", default = "default_rounds")]
    pub rounds: i64,
    /// Extra arguments for the start script.
    #[serde(default)]
    pub server_args: Vec<String>,
    /// Mapping/selector pairing filters.
    #[serde(default, rename = "pairing")]
    pub pairings: Vec<PairingConfig>,
    /// Table count override.
    #[serde(default)]
    pub table_count: Option<u64>,
    /// Table size override.
    #[serde(default)]
    pub table_size: Option<u64>,
    /// Remaining keys, kept as driver options.
    #[serde(flatten)]
    pub extra: BTreeMap<String, toml::Value>,
}

// ============================================================================
// SECTION: Validation
// ============================================================================

impl BenchmarkConfig {
    /// Validates the entry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self, engine_probe_index: Option<usize>) -> Result<(), ConfigError> {
        validate_name("benchmark.id", &self.id)?;
        require_non_empty(&self.field("bench_script"), &self.bench_script)?;
        self.threads()?;
        self.percentages()?;
        self.rounds()?;
        let mappings = self.parsed_mappings()?;
        if let Some(mappings) = &mappings {
            let width = mappings.first().map_or(0, EngineMapping::len);
            if mappings.iter().any(|mapping| mapping.len() != width) {
                return Err(self.invalid("mappings must all have the same length"));
            }
            if let Some(index) = engine_probe_index
                && index >= width
            {
                return Err(self.invalid(&format!(
                    "prepare.engine_probe_index {index} is outside mappings of length {width}"
                )));
            }
        }
        if let Some(txns) = &self.txns {
            let txns = txns.to_vec();
            if txns.is_empty() {
                return Err(self.invalid("txns must be non-empty when present"));
            }
            ensure_unique(&txns).map_err(|txn| self.invalid(&format!("duplicate txn {txn}")))?;
        }
        self.pairing_rules(mappings.as_deref())?;
        if self.table_count == Some(0) || self.table_size == Some(0) {
            return Err(self.invalid("table_count and table_size must be > 0"));
        }
        self.options()?;
        Ok(())
    }

    /// Returns validated thread counts.
    fn threads(&self) -> Result<Vec<u32>, ConfigError> {
        let values = self.connections.to_vec();
        if values.is_empty() {
            return Err(self.invalid("connections must be non-empty"));
        }
        let threads = values
            .iter()
            .map(|value| {
                u32::try_from(*value)
                    .ok()
                    .filter(|threads| *threads > 0)
                    .ok_or_else(|| self.invalid(&format!("connection count {value} must be > 0")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        ensure_unique(&threads)
            .map_err(|value| self.invalid(&format!("duplicate connection count {value}")))?;
        Ok(threads)
    }

    /// Returns validated cross-engine percentages.
    fn percentages(&self) -> Result<Vec<u8>, ConfigError> {
        let values = self.cross_engine_percentages.to_vec();
        if values.is_empty() {
            return Err(self.invalid("cross_engine_percentages must be non-empty"));
        }
        let percentages = values
            .iter()
            .map(|value| {
                u8::try_from(*value)
                    .ok()
                    .filter(|pct| i64::from(*pct) <= MAX_PERCENTAGE)
                    .ok_or_else(|| {
                        self.invalid(&format!("percentage {value} must be between 0 and 100"))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        ensure_unique(&percentages)
            .map_err(|value| self.invalid(&format!("duplicate percentage {value}")))?;
        Ok(percentages)
    }

    /// Returns the validated round count.
    fn rounds(&self) -> Result<u32, ConfigError> {
        u32::try_from(self.rounds)
            .ok()
            .filter(|rounds| *rounds > 0)
            .ok_or_else(|| self.invalid("rounds must be > 0"))
    }

    /// Parses engine mappings, when present.
    fn parsed_mappings(&self) -> Result<Option<Vec<EngineMapping>>, ConfigError> {
        let Some(raw) = &self.mappings else {
            return Ok(None);
        };
        let mappings = raw
            .to_vec()
            .iter()
            .map(|value| EngineMapping::parse(value).map_err(|err| self.invalid(&err.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        if mappings.is_empty() {
            return Err(self.invalid("mappings must be non-empty when present"));
        }
        ensure_unique(&mappings)
            .map_err(|mapping| self.invalid(&format!("duplicate mapping {mapping}")))?;
        Ok(Some(mappings))
    }

    /// Converts pairing entries into rules over the item's dimensions.
    fn pairing_rules(
        &self,
        mappings: Option<&[EngineMapping]>,
    ) -> Result<Vec<PairingRule>, ConfigError> {
        if self.pairings.is_empty() {
            return Ok(Vec::new());
        }
        let (Some(mappings), Some(txns)) = (mappings, &self.txns) else {
            return Err(self.invalid("pairing requires both mappings and txns"));
        };
        let txns = txns.to_vec();
        self.pairings
            .iter()
            .map(|pairing| {
                if !txns.contains(&pairing.txn) {
                    return Err(self.invalid(&format!(
                        "pairing txn {} is not in the item's txns",
                        pairing.txn
                    )));
                }
                let allowed = pairing
                    .mappings
                    .iter()
                    .map(|value| {
                        let mapping = EngineMapping::parse(value)
                            .map_err(|err| self.invalid(&err.to_string()))?;
                        if mappings.contains(&mapping) {
                            Ok(mapping)
                        } else {
                            Err(self.invalid(&format!(
                                "pairing mapping {mapping} is not in the item's mappings"
                            )))
                        }
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(PairingRule {
                    txn: pairing.txn,
                    mappings: allowed,
                })
            })
            .collect()
    }

    /// Renders extra scalar keys as driver options.
    fn options(&self) -> Result<BTreeMap<String, String>, ConfigError> {
        let mut options = BTreeMap::new();
        for (name, value) in &self.extra {
            if name == ENGINE_MAPPING_OPTION || name == TXN_OPTION {
                return Err(self.invalid(&format!("{name} is set per run; use mappings or txns")));
            }
            let rendered = match value {
                toml::Value::String(text) => text.clone(),
                toml::Value::Integer(number) => number.to_string(),
                toml::Value::Float(number) => number.to_string(),
                toml::Value::Boolean(flag) => flag.to_string(),
                toml::Value::Datetime(_) | toml::Value::Array(_) | toml::Value::Table(_) => {
                    return Err(self.invalid(&format!("unknown key {name} must be a scalar")));
                }
            };
            options.insert(name.clone(), rendered);
        }
        Ok(options)
    }

    // ========================================================================
    // SECTION: Conversion
    // ========================================================================

    /// Converts the entry into a core benchmark item.
    ///
    /// `defaults` supplies the table layout when the entry sets none.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the entry does not validate.
    pub fn to_item(&self, defaults: TableLayout) -> Result<BenchmarkItem, ConfigError> {
        let mappings = self.parsed_mappings()?;
        let tables = TableLayout {
            count: self.table_count.unwrap_or(defaults.count),
            size: self.table_size.unwrap_or(defaults.size),
        };
        let mut options = self.options()?;
        // The driver must read the layout the prepare step created, so the
        // effective table layout is always passed, defaults included.
        options.insert(TABLE_COUNT_OPTION.to_string(), tables.count.to_string());
        options.insert(TABLE_SIZE_OPTION.to_string(), tables.size.to_string());
        Ok(BenchmarkItem {
            id: self.id.clone(),
            bench_script: self.bench_script.clone(),
            pairings: self.pairing_rules(mappings.as_deref())?,
            mappings,
            threads: self.threads()?,
            txns: self.txns.as_ref().map(OneOrMany::to_vec),
            cross_engine_percentages: self.percentages()?,
            rounds: self.rounds()?,
            server_args: self.server_args.clone(),
            tables,
            options,
        })
    }

    // ========================================================================
    // SECTION: Helpers
    // ========================================================================

    /// Qualifies a field name with the item id.
    fn field(&self, name: &str) -> String {
        format!("benchmark {}: {name}", self.id)
    }

    /// Builds an invalid-config error scoped to this item.
    fn invalid(&self, message: &str) -> ConfigError {
        ConfigError::Invalid(format!("benchmark {}: {message}", self.id))
    }
}

/// Returns the first repeated value, if any.
fn ensure_unique<T: Ord + Clone>(values: &[T]) -> Result<(), T> {
    let mut seen = BTreeSet::new();
    for value in values {
        if !seen.insert(value.clone()) {
            return Err(value.clone());
        }
    }
    Ok(())
}

/// Default cross-engine percentages.
const fn default_percentages() -> OneOrMany<i64> {
    OneOrMany::One(0)
}

/// Default round count.
const fn default_rounds() -> i64 {
    1
}
