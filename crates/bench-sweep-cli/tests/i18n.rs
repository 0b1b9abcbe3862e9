// crates/bench-sweep-cli/tests/i18n.rs
// ============================================================================
// Module: CLI i18n Tests
// Description: Exercises the translation catalog and placeholder substitution.
// Purpose: Ensure CLI user-facing strings route through stable i18n helpers.
// ============================================================================

//! ## Overview
//! Validates message arguments, key fallback, and the
//! [`t!`](bench_sweep_cli::t) macro.

use bench_sweep_cli::i18n::MessageArg;
use bench_sweep_cli::i18n::translate;
use bench_sweep_cli::t;

#[test]
fn message_arg_new_captures_key_and_value() {
    let arg = MessageArg::new("path", "/srv/bench/logs");
    assert_eq!(arg.key, "path");
    assert_eq!(arg.value, "/srv/bench/logs");
}

#[test]
fn translate_substitutes_placeholders() {
    let result = translate("sweep.item_unknown", vec![MessageArg::new("item", "tpcc")]);
    assert_eq!(result, "Unknown benchmark item: tpcc");
}

#[test]
fn translate_falls_back_to_key() {
    assert_eq!(translate("missing.key", Vec::new()), "missing.key");
}

#[test]
fn t_macro_formats_several_arguments() {
    let message = t!("plan.entry", index = 3, run_id = "oltp-conn_1-inno_0@1.000", command = "sysbench run");
    assert_eq!(message, "3\toltp-conn_1-inno_0@1.000\tsysbench run");
}
