use std::fs;
use std::path::Path;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

fn diagnostics_cmd(prefs: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("timehub");
    cmd.env_remove("RUST_LOG")
        .arg("--diagnostics")
        .arg("--bench-ms")
        .arg("200")
        .arg("--prefs")
        .arg(prefs);
    cmd
}

#[test]
fn diagnostics_reports_selected_zone_and_benchmark() {
    let dir = tempdir().expect("tempdir");
    let prefs = dir.path().join("prefs.json");

    diagnostics_cmd(&prefs)
        .assert()
        .success()
        .stdout(predicate::str::contains("Selected time zone: Local Time (local)"))
        .stdout(predicate::str::contains("Benchmark summary"))
        .stdout(predicate::str::contains("Fallback reason").not());
}

#[test]
fn unknown_zone_reports_fallback() {
    let dir = tempdir().expect("tempdir");
    let prefs = dir.path().join("prefs.json");

    diagnostics_cmd(&prefs)
        .arg("--time-zone")
        .arg("Mars/Olympus_Mons")
        .assert()
        .success()
        .stdout(predicate::str::contains("Selected time zone: Local Time"))
        .stdout(predicate::str::contains("Fallback reason"));
}

#[test]
fn selected_zone_is_remembered_between_runs() {
    let dir = tempdir().expect("tempdir");
    let prefs = dir.path().join("prefs.json");

    diagnostics_cmd(&prefs)
        .arg("--time-zone")
        .arg("Asia/Tokyo")
        .assert()
        .success();
    let saved = fs::read_to_string(&prefs).expect("prefs written");
    assert!(saved.contains("Asia/Tokyo"));

    diagnostics_cmd(&prefs)
        .assert()
        .success()
        .stdout(predicate::str::contains("Selected time zone: Tokyo (JST)"));
}

#[test]
fn hour_12_flag_is_reported() {
    let dir = tempdir().expect("tempdir");
    let prefs = dir.path().join("prefs.json");

    diagnostics_cmd(&prefs)
        .arg("--hour-12")
        .arg("--time-zone")
        .arg("UTC")
        .assert()
        .success()
        .stdout(predicate::str::contains("[12-hour]"))
        .stdout(predicate::str::is_match(r"Clock: \d{2}:\d{2}:\d{2} (AM|PM)").expect("regex"));
}

#[test]
fn malformed_prefs_file_is_ignored_with_warning() {
    let dir = tempdir().expect("tempdir");
    let prefs = dir.path().join("prefs.json");
    fs::write(&prefs, "{ not-valid-json ").expect("write invalid json");

    diagnostics_cmd(&prefs)
        .assert()
        .success()
        .stdout(predicate::str::contains("Selected time zone: Local Time"))
        .stderr(predicate::str::contains("ignoring unusable preference file"));
}

#[test]
fn malformed_prefs_file_is_backed_up_when_replaced() {
    let dir = tempdir().expect("tempdir");
    let prefs = dir.path().join("prefs.json");
    fs::write(&prefs, "{ not-valid-json ").expect("write invalid json");

    diagnostics_cmd(&prefs)
        .arg("--time-zone")
        .arg("Europe/Berlin")
        .assert()
        .success()
        .stderr(predicate::str::contains("replacing unusable preference file"));

    let backup = dir.path().join("prefs.json.bak");
    assert_eq!(
        fs::read_to_string(backup).expect("backup written"),
        "{ not-valid-json "
    );
    assert!(fs::read_to_string(&prefs).expect("prefs").contains("Europe/Berlin"));
}

#[test]
fn zero_bench_length_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let prefs = dir.path().join("prefs.json");

    let mut cmd = cargo_bin_cmd!("timehub");
    cmd.arg("--diagnostics")
        .arg("--bench-ms")
        .arg("0")
        .arg("--prefs")
        .arg(prefs)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--bench-ms must be greater than zero"));
}

#[test]
fn oversized_bench_length_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let prefs = dir.path().join("prefs.json");

    let mut cmd = cargo_bin_cmd!("timehub");
    cmd.arg("--diagnostics")
        .arg("--bench-ms")
        .arg("18446744073709551615")
        .arg("--prefs")
        .arg(prefs)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--bench-ms must be at most 3600000"))
        .stderr(predicate::str::contains("panicked").not());
}
