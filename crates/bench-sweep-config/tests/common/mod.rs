// crates/bench-sweep-config/tests/common/mod.rs
// ============================================================================
// Module: Config Test Fixtures
// Description: Shared TOML fixtures for config validation suites.
// ============================================================================
//! ## Overview
//! Provides a minimal valid sweep description and assertion helpers.

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use bench_sweep_config::ConfigError;
use bench_sweep_config::SweepConfig;

pub type TestResult = Result<(), String>;

pub const BASE: &str = r#"
name = "nightly"

[system]
socket = "/tmp/bench-sweep/mysql.sock"
cwd = "/srv/bench"

[server]
binary = "/srv/bench/bin/mysqld"
storage_dir = "/srv/bench/data"
"#;

pub const BENCHMARK: &str = r#"
[[benchmark]]
id = "oltp"
bench_script = "oltp_read_write"
connections = [1, 2]
"#;

/// Returns the base document with extra sections appended.
pub fn document(sections: &str) -> String {
    format!("{BASE}\n{sections}")
}

/// Parses a document made of the base, the given sections, and one benchmark.
pub fn with_benchmark(sections: &str) -> Result<SweepConfig, ConfigError> {
    SweepConfig::from_toml(&format!("{BASE}\n{sections}\n{BENCHMARK}"))
}

pub fn assert_invalid<T>(result: Result<T, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}
