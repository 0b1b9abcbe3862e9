// crates/bench-sweep-core/src/core/identifiers.rs
// ============================================================================
// Module: Bench Sweep Identifiers
// Description: Run identifiers, engine mappings, and sweep timestamps.
// Purpose: Provide strongly typed values with stable string forms.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Run identifiers are deterministic strings derived from a run's dimension
//! values plus the sweep start timestamp. Engine mappings encode, one
//! character per logical table, whether the primary (`I`) or alternate (`E`)
//! storage engine backs that table.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Run Identifier
// ============================================================================

/// Run identifier, unique within one sweep execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Creates a new run identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for RunId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Engine Mapping
// ============================================================================

/// Character marking a table backed by the primary engine.
pub const PRIMARY_ENGINE_CHAR: char = 'I';
/// Character marking a table backed by the alternate engine.
pub const ALTERNATE_ENGINE_CHAR: char = 'E';

/// Engine mapping parse errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// Mapping string was empty.
    #[error("engine mapping must be non-empty")]
    Empty,
    /// Mapping string contained a character other than `I` or `E`.
    #[error("engine mapping {mapping} contains invalid character '{found}'")]
    InvalidChar {
        /// Offending mapping string.
        mapping: String,
        /// First invalid character.
        found: char,
    },
}

/// Storage engine variant selected for a table or preparation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineVariant {
    /// Primary engine (`I`).
    Primary,
    /// Alternate engine (`E`).
    Alternate,
}

/// Engine mapping string such as `IIEIIIIIE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EngineMapping(String);

impl EngineMapping {
    /// Parses and validates an engine mapping string.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError`] when the string is empty or contains
    /// characters other than `I` and `E`.
    pub fn parse(value: &str) -> Result<Self, MappingError> {
        if value.is_empty() {
            return Err(MappingError::Empty);
        }
        if let Some(found) =
            value.chars().find(|ch| *ch != PRIMARY_ENGINE_CHAR && *ch != ALTERNATE_ENGINE_CHAR)
        {
            return Err(MappingError::InvalidChar {
                mapping: value.to_string(),
                found,
            });
        }
        Ok(Self(value.to_string()))
    }

    /// Returns the mapping as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the number of tables covered by the mapping.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when the mapping covers no tables (never for parsed values).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the engine variant backing the table at `index`.
    #[must_use]
    pub fn variant_at(&self, index: usize) -> Option<EngineVariant> {
        self.0.chars().nth(index).map(|ch| {
            if ch == ALTERNATE_ENGINE_CHAR {
                EngineVariant::Alternate
            } else {
                EngineVariant::Primary
            }
        })
    }
}

impl fmt::Display for EngineMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for EngineMapping {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// SECTION: Sweep Timestamp
// ============================================================================

/// Wall-clock sweep start time, fixed once per sweep invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SweepTimestamp(u64);

impl SweepTimestamp {
    /// Creates a timestamp from milliseconds since the Unix epoch.
    #[must_use]
    pub const fn from_unix_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Captures the current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        let millis = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self(u64::try_from(millis).unwrap_or(u64::MAX))
    }

    /// Returns milliseconds since the Unix epoch.
    #[must_use]
    pub const fn unix_millis(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SweepTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}", self.0 / 1000, self.0 % 1000)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
