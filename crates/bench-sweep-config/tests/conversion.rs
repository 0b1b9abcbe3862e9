// crates/bench-sweep-config/tests/conversion.rs
// ============================================================================
// Module: Config Conversion Tests
// Description: Conversion of validated files into core sweep values.
// Purpose: Ensure defaults, overrides, and path resolution reach the core.
// ============================================================================
//! ## Overview
//! Checks the [`bench_sweep_core::SweepDescription`] and
//! [`bench_sweep_core::StaticConfig`] built from a parsed description.

#![allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]

mod common;

use std::path::PathBuf;
use std::time::Duration;

use bench_sweep_config::SweepConfig;
use bench_sweep_core::EngineMapping;
use bench_sweep_core::ReadinessMode;
use bench_sweep_core::TableLayout;

const FULL: &str = r#"
name = "nightly"

[system]
socket = "/tmp/bench-sweep/mysql.sock"
cwd = "/srv/bench"
cpuset = "0-15"
ignore_errors = ["1213", "1020"]
stage_files = ["/opt/scripts/start_mysqld.sh"]

[server]
binary = "/srv/bench/bin/mysqld"
storage_dir = "/srv/bench/data"
readiness_mode = "poll"
post_ready_delay_ms = 250

[prepare]
engine_probe_index = 2
alternate_script = "./prepare_tables_alt.sh"
table_count = 8
table_size = 50000

[restart]
max_attempts = 5

[driver]
program = "./run-inno.sh"
alternate_program = "./run.sh"

[driver.flags]
duration = "--max-time"
warmup = "--warmup-time"

[[benchmark]]
id = "oltp"
bench_script = "oltp_read_write"
connection = [1, 8]
innodb_percentage = [0, 50]
mappings = ["IIE", "IEE"]
txns = [1, 2]
nround = 3
server_args = ["--ermia-ermia-bypass=TRUE"]
duration = 60
random_type = "uniform"
warmup = 10
skip_trx = true
table_count = 16

[[benchmark.pairing]]
txn = 2
mappings = ["IEE"]

[[benchmark]]
id = "point"
bench_script = "oltp_point_select"
connections = 4
"#;

fn full() -> SweepConfig {
    SweepConfig::from_toml(FULL).unwrap()
}

#[test]
fn description_carries_dimensions_and_options() {
    let description = full().sweep_description().unwrap();
    assert_eq!(description.name, "nightly");
    assert_eq!(description.items.len(), 2);

    let oltp = &description.items[0];
    assert_eq!(oltp.threads, vec![1, 8]);
    assert_eq!(oltp.cross_engine_percentages, vec![0, 50]);
    assert_eq!(
        oltp.mappings,
        Some(vec![EngineMapping::parse("IIE").unwrap(), EngineMapping::parse("IEE").unwrap()])
    );
    assert_eq!(oltp.txns, Some(vec![1, 2]));
    assert_eq!(oltp.rounds, 3);
    assert_eq!(oltp.server_args, vec!["--ermia-ermia-bypass=TRUE".to_string()]);
    assert_eq!(
        oltp.tables,
        TableLayout {
            count: 16,
            size: 50_000,
        }
    );
    assert_eq!(oltp.options["duration"], "60");
    assert_eq!(oltp.options["random_type"], "uniform");
    assert_eq!(oltp.options["skip_trx"], "true");
    assert_eq!(oltp.options["table_count"], "16");
    assert_eq!(oltp.options["table_size"], "50000");
    assert_eq!(oltp.pairings.len(), 1);
    assert!(!oltp.allows(Some(&EngineMapping::parse("IIE").unwrap()), Some(2)));
    assert!(oltp.allows(Some(&EngineMapping::parse("IIE").unwrap()), Some(1)));
    assert_eq!(oltp.product_len(), 16);

    let point = &description.items[1];
    assert_eq!(point.threads, vec![4]);
    assert_eq!(point.cross_engine_percentages, vec![0]);
    assert_eq!(point.rounds, 1);
    assert_eq!(point.mappings, None);
    assert_eq!(point.options["table_count"], "8");
}

#[test]
fn static_config_merges_driver_flags_and_resolves_log_dir() {
    let config = full().static_config();
    assert_eq!(config.environment.cpuset.as_deref(), Some("0-15"));
    assert_eq!(config.environment.ignore_errors, vec!["1213".to_string(), "1020".to_string()]);
    assert_eq!(config.environment.cwd, PathBuf::from("/srv/bench"));
    assert_eq!(config.environment.log_dir, PathBuf::from("/srv/bench/logs"));
    assert_eq!(
        config.environment.stage_files,
        vec![PathBuf::from("/opt/scripts/start_mysqld.sh")]
    );
    assert_eq!(config.server.readiness_mode, ReadinessMode::Poll);
    assert_eq!(config.server.readiness_timeout, Duration::from_secs(180));
    assert_eq!(config.server.post_ready_delay, Duration::from_millis(250));
    assert_eq!(config.prepare.engine_probe_index, Some(2));
    assert_eq!(config.restart.max_attempts, Some(5));
    assert_eq!(config.driver.flags["duration"], "--max-time");
    assert_eq!(config.driver.flags["warmup"], "--warmup-time");
    assert_eq!(config.driver.flags["random_type"], "--rand-type");
    assert_eq!(config.driver.program, "./run-inno.sh");
    assert_eq!(config.driver.alternate_program.as_deref(), Some("./run.sh"));
    assert_eq!(config.driver.mode, "run");
}

#[test]
fn absolute_log_dir_is_kept() {
    let text = format!(
        "{}\n{}",
        common::BASE.replace("cwd = \"/srv/bench\"", "cwd = \"/srv/bench\"\nlog_dir = \"/var/log/sweeps\""),
        common::BENCHMARK
    );
    let config = SweepConfig::from_toml(&text).unwrap().static_config();
    assert_eq!(config.environment.log_dir, PathBuf::from("/var/log/sweeps"));
}

#[test]
fn narrowing_keeps_requested_items_in_file_order() {
    let description = full().sweep_description().unwrap();
    let narrowed = description.narrowed(&["point".to_string()]);
    assert_eq!(narrowed.items.len(), 1);
    assert_eq!(narrowed.items[0].id, "point");
}
