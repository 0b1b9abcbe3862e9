// crates/bench-sweep-config/tests/load_validation.rs
// ============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards (path, size, encoding).
// Purpose: Ensure config input handling is strict and fail-closed.
// ============================================================================
//! ## Overview
//! Exercises the file-level guards applied before TOML parsing.

mod common;

use std::fs;
use std::io::Write;
use std::path::Path;

use bench_sweep_config::SweepConfig;
use common::TestResult;
use common::assert_invalid;
use tempfile::NamedTempFile;

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    assert_invalid(SweepConfig::load(Some(Path::new(&long_path))), "config path exceeds max length")
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    assert_invalid(
        SweepConfig::load(Some(Path::new(&long_component))),
        "config path component too long",
    )
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&vec![b'a'; 1_048_577]).map_err(|err| err.to_string())?;
    assert_invalid(SweepConfig::load(Some(file.path())), "config file exceeds size limit")
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&[0xFF, 0xFE, 0xFF]).map_err(|err| err.to_string())?;
    assert_invalid(SweepConfig::load(Some(file.path())), "config file must be utf-8")
}

#[test]
fn load_reports_missing_file_as_io_error() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    assert_invalid(SweepConfig::load(Some(&dir.path().join("absent.toml"))), "config io error")
}

#[test]
fn load_reports_syntax_errors_as_parse_errors() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(b"name = \"unterminated").map_err(|err| err.to_string())?;
    assert_invalid(SweepConfig::load(Some(file.path())), "config parse error")
}

#[test]
fn load_rejects_unknown_sections() -> TestResult {
    let text = format!("{}\n[metrics]\nenabled = true\n{}", common::BASE, common::BENCHMARK);
    assert_invalid(SweepConfig::from_toml(&text), "config parse error")
}

#[test]
fn load_accepts_minimal_description() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("bench-sweep.toml");
    fs::write(&path, format!("{}\n{}", common::BASE, common::BENCHMARK))
        .map_err(|err| err.to_string())?;
    let config = SweepConfig::load(Some(&path)).map_err(|err| err.to_string())?;
    if config.name != "nightly" || config.benchmarks.len() != 1 {
        return Err("minimal description did not load as written".to_string());
    }
    if config.server.readiness_timeout_secs != 180 || config.prepare.creator_threads != 64 {
        return Err("defaults were not applied".to_string());
    }
    Ok(())
}
