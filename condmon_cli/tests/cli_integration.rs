use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

// Process log with every marker present; staleness is disabled by default.
fn write_process_log(dir: &Path, volume: f64) -> PathBuf {
    let path = dir.join("InVitroApp.txt");
    let text = format!(
        "02/05/2024 09:00 [Info] Concentration step change to 450 in 3 steps\n\
         02/05/2024 09:05 [Info] Temperature step function set to 33 degrees\n\
         02/05/2024 09:30 [Info] Current volume {volume}\n\
         02/05/2024 09:30 [Info] Current concentration 400\n"
    );
    fs::write(&path, text).unwrap();
    path
}

fn condmon() -> Command {
    let mut cmd = Command::cargo_bin("condmon").unwrap();
    for var in ["CONDMON_CONFIG", "CONDMON_OUTPUT_DIR", "CONDMON_LOG_FILE", "RUST_LOG"] {
        cmd.env_remove(var);
    }
    cmd
}

fn csv_files(dir: &Path) -> Vec<PathBuf> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|x| x == "csv"))
        .collect()
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["run", "--bursts"], 2, "value is required", "stderr")]
#[case(&["frobnicate"], 2, "unrecognized subcommand", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let assert = condmon().args(args).assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[rstest]
fn run_persists_validated_rows() {
    let dir = tempdir().unwrap();
    let log = write_process_log(dir.path(), 42.0);

    // 2000 samples at 20.48 us = 40.96 ms per burst: two bursts per 50 ms cycle.
    condmon()
        .arg("--output-dir")
        .arg(dir.path())
        .arg("--log-file")
        .arg(&log)
        .args(["--rate-ms", "50", "run", "--bursts", "10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("persisted 5"));

    let files = csv_files(dir.path());
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("Picoresults_"), "{name}");

    let text = fs::read_to_string(&files[0]).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 6);
    assert!(lines[0].starts_with("concentration [mg/dL],target concentration [mg/dL]"));
    assert!(lines[1].starts_with("400.0,450.0,42.0,33.0,"));
}

#[rstest]
fn low_volume_rows_are_never_written() {
    let dir = tempdir().unwrap();
    let log = write_process_log(dir.path(), 12.5);
    condmon()
        .arg("--output-dir")
        .arg(dir.path())
        .arg("--log-file")
        .arg(&log)
        .args(["--rate-ms", "50", "--json", "run", "--bursts", "20"])
        .assert()
        .success()
        .stdout(predicate::function(|out: &str| {
            let line = out.lines().last().unwrap_or_default();
            let v: serde_json::Value = serde_json::from_str(line).unwrap();
            v["persisted"] == 0 && v["rejected"].as_u64().unwrap_or(0) >= 10
        }));

    let files = csv_files(dir.path());
    assert_eq!(files.len(), 1);
    assert_eq!(fs::read_to_string(&files[0]).unwrap().lines().count(), 1);
}

#[rstest]
fn no_save_writes_nothing() {
    let dir = tempdir().unwrap();
    let log = write_process_log(dir.path(), 42.0);
    condmon()
        .arg("--output-dir")
        .arg(dir.path())
        .arg("--log-file")
        .arg(&log)
        .args(["--rate-ms", "50", "--no-save", "run", "--bursts", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("persisted 2"));
    assert!(csv_files(dir.path()).is_empty());
}

#[rstest]
fn missing_output_dir_is_a_persistence_error() {
    let dir = tempdir().unwrap();
    condmon()
        .arg("--output-dir")
        .arg(dir.path().join("does-not-exist"))
        .args(["run", "--bursts", "1"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("persistence sink"));
}

#[rstest]
#[case("[acquisition]\nwindow = 0\n", "acquisition.window")]
#[case("[logging]\nrotation = \"weekly\"\n", "logging.rotation")]
#[case("[signal\n", "configuration")]
fn invalid_config_exits_2(#[case] toml: &str, #[case] needle: &str) {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("condmon.toml");
    fs::write(&cfg, toml).unwrap();
    condmon()
        .arg("--config")
        .arg(&cfg)
        .args(["--no-save", "run", "--bursts", "1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains(needle));
}

#[rstest]
fn config_errors_as_json() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("condmon.toml");
    fs::write(&cfg, "[acquisition]\nwindow = 0\n").unwrap();
    let out = condmon()
        .arg("--config")
        .arg(&cfg)
        .args(["--json", "self-check"])
        .assert()
        .code(2)
        .get_output()
        .stderr
        .clone();
    let text = String::from_utf8(out).unwrap();
    let line = text.lines().last().unwrap();
    let v: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(v["reason"], "Config");
    assert_eq!(v["exit_code"], 2);
}

#[rstest]
fn log_snapshot_prints_values() {
    let dir = tempdir().unwrap();
    let log = write_process_log(dir.path(), 42.0);
    condmon()
        .arg("--log-file")
        .arg(&log)
        .args(["--json", "log-snapshot"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"volume\":42.0"));
}

#[rstest]
fn log_snapshot_reports_missing_file() {
    let dir = tempdir().unwrap();
    condmon()
        .arg("--log-file")
        .arg(dir.path().join("absent.txt"))
        .arg("log-snapshot")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("invalid"));
}

#[rstest]
fn self_check_reads_one_burst() {
    let dir = tempdir().unwrap();
    let log = write_process_log(dir.path(), 42.0);
    condmon()
        .arg("--log-file")
        .arg(&log)
        .arg("self-check")
        .assert()
        .success()
        .stdout(predicate::str::contains("instrument ok: 2000 samples"))
        .stdout(predicate::str::contains("process log ok"));
}

#[rstest]
fn debug_profile_disables_output() {
    let dir = tempdir().unwrap();
    let log = write_process_log(dir.path(), 42.0);
    // Debug cadence is 2 s: 49 bursts of 40.96 ms before the first measurement.
    condmon()
        .current_dir(dir.path())
        .arg("--debug")
        .arg("--log-file")
        .arg(&log)
        .args(["run", "--bursts", "50"])
        .assert()
        .success()
        .stdout(predicate::str::contains("persisted 1"));
    assert!(csv_files(dir.path()).is_empty());
}

#[rstest]
fn debug_flag_keeps_cadence_from_config_file() {
    let dir = tempdir().unwrap();
    let log = write_process_log(dir.path(), 42.0);
    let cfg = dir.path().join("condmon.toml");
    fs::write(
        &cfg,
        format!(
            "[paths]\nlog_file = {:?}\n[acquisition]\nmeasurement_rate_ms = 50\n",
            log.display().to_string()
        ),
    )
    .unwrap();
    // Profile still disables output, but the file's 50 ms cadence wins over 2 s.
    condmon()
        .current_dir(dir.path())
        .arg("--config")
        .arg(&cfg)
        .arg("--debug")
        .args(["run", "--bursts", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("persisted 2"));
    assert!(csv_files(dir.path()).is_empty());
}
