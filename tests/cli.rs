// Exercises the `trial` binary end to end. Each test runs in a scratch
// directory whose trial.yaml turns the slow test's sleep off.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn workspace(config: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("trial.yaml"), config).unwrap();
    dir
}

fn trial(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("trial").unwrap();
    cmd.current_dir(dir.path()).arg("--color").arg("never");
    cmd
}

#[test]
fn default_run_fails_on_the_slow_test() {
    let dir = workspace("slow_delay_ms: 0\n");
    trial(&dir)
        .assert()
        .code(1)
        .stdout(contains("collected 11 items"))
        .stdout(contains("FAILED test_example::test_type"))
        .stdout(contains("1 failed, 7 passed, 2 skipped, 1 xfailed in "));
}

#[test]
fn deselecting_slow_exits_cleanly() {
    let dir = workspace("slow_delay_ms: 0\n");
    trial(&dir)
        .args(["-m", "not slow"])
        .assert()
        .code(0)
        .stdout(contains("7 passed, 2 skipped, 1 deselected, 1 xfailed"));
}

#[test]
fn verbose_run_lists_each_node() {
    let dir = workspace("slow_delay_ms: 0\n");
    trial(&dir)
        .args(["-v", "-k", "product"])
        .assert()
        .code(0)
        .stdout(contains("test_example::test_cartesian_product[one-1] PASSED"))
        .stdout(contains("test_example::test_cartesian_product[two-2] PASSED"));
}

#[test]
fn nothing_selected_is_its_own_exit_code() {
    let dir = workspace("slow_delay_ms: 0\n");
    trial(&dir)
        .args(["-k", "no_such_test"])
        .assert()
        .code(5)
        .stdout(contains("11 deselected"));
}

#[test]
fn collect_only_lists_node_ids_without_running() {
    let dir = workspace("slow_delay_ms: 0\n");
    trial(&dir)
        .arg("--collect-only")
        .assert()
        .code(0)
        .stdout(contains("test_example::test_one_more[Second parameter]"))
        .stdout(contains("test_pdb::test_will_be_skipped"))
        .stdout(contains("passed").not());
}

#[test]
fn markers_lists_registered_and_builtin_marks() {
    let dir = workspace("markers:\n  db: needs a database\n");
    trial(&dir)
        .arg("--markers")
        .assert()
        .success()
        .stdout(contains("@mark.db: needs a database"))
        .stdout(contains("@mark.skipif"));
}

#[test]
fn json_output_is_machine_readable() {
    let dir = workspace("slow_delay_ms: 0\n");
    let output = trial(&dir).args(["--json", "-m", "not slow"]).output().unwrap();
    assert_eq!(output.status.code(), Some(0));

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["exit_code"], 0);
    assert_eq!(summary["counts"]["passed"], 7);
    assert_eq!(summary["deselected"][0], "test_example::test_type");
    let xfail = summary["reports"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["param_id"] == "Second parameter")
        .unwrap();
    assert_eq!(xfail["outcome"], "xfailed");
    assert_eq!(xfail["params"]["input_arg"], 3);
}

#[test]
fn bad_mark_expression_is_a_usage_error() {
    let dir = workspace("slow_delay_ms: 0\n");
    trial(&dir)
        .args(["-m", "slow and"])
        .assert()
        .code(4)
        .stderr(contains("wrong expression passed to '-m'").or(contains("trial::mark::expression")));
}

#[test]
fn unknown_config_key_is_a_usage_error() {
    let dir = workspace("slow_delay_ms: 0\nno_such_option: true\n");
    trial(&dir)
        .assert()
        .code(4)
        .stderr(contains("failed to parse config").or(contains("trial::config::parse")));
}

#[test]
fn strict_markers_rejects_unregistered_slow() {
    let dir = workspace("slow_delay_ms: 0\nmarkers: {}\n");
    trial(&dir)
        .arg("--strict-markers")
        .assert()
        .code(2)
        .stdout(contains("ERROR collecting test_example::test_type"))
        .stdout(contains("'slow' not found in `markers` configuration option"));
}
