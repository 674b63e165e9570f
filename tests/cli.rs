use assert_cmd::Command;
use predicates::prelude::*;

/// Default config written into the test's working directory so runs never
/// touch the user's real config
const CONFIG_YAML: &str = "\
paths:
  manifest_path: video_segments.json
  output_dir: segments
  input_dir: null
  progress_log_path: progress.log
batch:
  concurrency: 1
  fetch_retries: 2
  retry_delay_secs: 2
  segment_timeout_secs: 600
  limit: null
";

fn harvester_in(dir: &tempfile::TempDir) -> Command {
    fs_err::write(dir.path().join("config.yaml"), CONFIG_YAML).unwrap();
    let mut cmd = Command::cargo_bin("harvester").unwrap();
    cmd.current_dir(dir.path());
    cmd
}

#[test]
fn help_mentions_the_tool() {
    Command::cargo_bin("harvester")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: harvester"))
        .stdout(predicate::str::contains("segment manifest"));
}

#[test]
fn status_reports_counts_from_manifest_and_ledger() {
    let dir = tempfile::tempdir().unwrap();
    fs_err::write(
        dir.path().join("video_segments.json"),
        r#"{"vid1": {"start": [0], "end": [5], "text": ["a"]}, "vid2": {"start": [0], "end": [5], "text": ["b"]}}"#,
    )
    .unwrap();
    fs_err::write(
        dir.path().join("progress.log"),
        "# segment-harvester progress log\nProcessing: vid1\nCompleted: vid1\n",
    )
    .unwrap();

    harvester_in(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Manifest items: 2"))
        .stdout(predicate::str::contains("Completed: 1"))
        .stdout(predicate::str::contains("Pending: 1"));
}

#[test]
fn run_rejects_malformed_manifest() {
    let dir = tempfile::tempdir().unwrap();
    fs_err::write(
        dir.path().join("video_segments.json"),
        r#"{"vid1": {"start": [0, 1], "end": [5], "text": ["a", "b"]}}"#,
    )
    .unwrap();

    harvester_in(&dir)
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("mismatched lengths"));
}

#[test]
fn config_show_prints_settings() {
    let dir = tempfile::tempdir().unwrap();

    harvester_in(&dir)
        .args(["config", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Concurrency: 1"));
}
