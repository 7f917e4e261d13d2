//! CLI integration tests using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const ANSWER_KEY: &str = "../../answer-keys/physics-midterm.toml";
const SUBMISSIONS: &str = "../../submissions/physics-midterm.toml";

fn markwise() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("markwise").unwrap();
    cmd.env_remove("MARKWISE_SCORER_URL").env("RUST_LOG", "off");
    cmd
}

fn write_mock_config(dir: &Path, mark: f64) -> std::path::PathBuf {
    let path = dir.join("markwise.toml");
    std::fs::write(
        &path,
        format!("[scorer]\ntype = \"mock\"\nmock_mark = {mark}\n"),
    )
    .unwrap();
    path
}

fn single_report(dir: &Path, extension: &str) -> std::path::PathBuf {
    let mut matches: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|ext| ext == extension))
        .collect();
    assert_eq!(matches.len(), 1, "expected one .{extension} file in {}", dir.display());
    matches.remove(0)
}

#[test]
fn validate_answer_key() {
    markwise()
        .arg("validate")
        .arg("--answer-key")
        .arg(ANSWER_KEY)
        .assert()
        .success()
        .stdout(predicate::str::contains("4 questions, 15 marks"))
        .stdout(predicate::str::contains("All inputs valid"));
}

#[test]
fn validate_with_submissions_reports_unmatched_and_empty() {
    markwise()
        .arg("validate")
        .arg("--answer-key")
        .arg(ANSWER_KEY)
        .arg("--submissions")
        .arg(SUBMISSIONS)
        .assert()
        .success()
        .stdout(predicate::str::contains("Submissions: 3 students"))
        .stdout(predicate::str::contains("question 'Q9' has no entry"))
        .stdout(predicate::str::contains("[Chen Wei (23)] WARNING: submission has no answers"))
        .stdout(predicate::str::contains("2 warning(s) found"));
}

#[test]
fn validate_json_key_with_duplicates() {
    markwise()
        .arg("validate")
        .arg("--answer-key")
        .arg("../../answer-keys/geography-quiz.json")
        .assert()
        .success()
        .stdout(predicate::str::contains("Geography Quiz (3 questions"))
        .stdout(predicate::str::contains("duplicate question key 'q1'"));
}

#[test]
fn validate_nonexistent_file() {
    markwise()
        .arg("validate")
        .arg("--answer-key")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn validate_malformed_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[answer_key\nid = ").unwrap();

    markwise()
        .arg("validate")
        .arg("--answer-key")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed input"));
}

#[test]
fn evaluate_with_mock_scorer_writes_reports() {
    let dir = TempDir::new().unwrap();
    let config = write_mock_config(dir.path(), 1.0);
    let output = dir.path().join("out");

    markwise()
        .arg("evaluate")
        .arg("--answer-key")
        .arg(ANSWER_KEY)
        .arg("--submissions")
        .arg(SUBMISSIONS)
        .arg("--config")
        .arg(&config)
        .arg("--output")
        .arg(&output)
        .arg("--format")
        .arg("all")
        .assert()
        .success()
        .stderr(predicate::str::contains("Asha Rao"))
        .stderr(predicate::str::contains("Q9 skipped"))
        .stderr(predicate::str::contains("Distribution: 0 good, 2 average, 1 low"));

    let json = std::fs::read_to_string(single_report(&output, "json")).unwrap();
    let report: serde_json::Value = serde_json::from_str(&json).unwrap();
    let students = report["batch"]["students"].as_array().unwrap();
    assert_eq!(students.len(), 3);
    assert_eq!(students[0]["total_score"], 8);
    assert_eq!(students[0]["total_possible"], 15);
    assert_eq!(students[1]["total_score"], 3);
    assert_eq!(students[1]["records"][1]["provenance"], "exact_match");
    assert_eq!(report["statistics"]["leaderboard"][0]["student"]["name"], "Asha Rao");

    let md = std::fs::read_to_string(single_report(&output, "md")).unwrap();
    assert!(md.contains("# Physics Midterm results"));
}

#[test]
fn evaluate_degrades_when_server_unreachable() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out");

    markwise()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .arg("evaluate")
        .arg("--answer-key")
        .arg(Path::new(env!("CARGO_MANIFEST_DIR")).join(ANSWER_KEY))
        .arg("--submissions")
        .arg(Path::new(env!("CARGO_MANIFEST_DIR")).join(SUBMISSIONS))
        .arg("--scorer-url")
        .arg("http://127.0.0.1:9")
        .arg("--timeout-secs")
        .arg("2")
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let json = std::fs::read_to_string(single_report(&output, "json")).unwrap();
    let report: serde_json::Value = serde_json::from_str(&json).unwrap();
    let asha = &report["batch"]["students"][0];
    // Only the exact match scores.
    assert_eq!(asha["total_score"], 5);
    assert_eq!(asha["records"][1]["provenance"], "degraded");
    assert!(asha["records"][1]["explanation"]
        .as_str()
        .unwrap()
        .contains("defaulted to 0 marks"));
}

#[test]
fn evaluate_rejects_empty_student_list() {
    let dir = TempDir::new().unwrap();
    let config = write_mock_config(dir.path(), 0.0);
    let empty = dir.path().join("empty.toml");
    std::fs::write(&empty, "").unwrap();

    markwise()
        .arg("evaluate")
        .arg("--answer-key")
        .arg(ANSWER_KEY)
        .arg("--submissions")
        .arg(&empty)
        .arg("--config")
        .arg(&config)
        .arg("--output")
        .arg(dir.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("no student submissions"));
}

#[test]
fn evaluate_rejects_unknown_format() {
    markwise()
        .arg("evaluate")
        .arg("--answer-key")
        .arg(ANSWER_KEY)
        .arg("--submissions")
        .arg(SUBMISSIONS)
        .arg("--format")
        .arg("pdf")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format 'pdf'"));
}

#[test]
fn stats_from_saved_report() {
    let dir = TempDir::new().unwrap();
    let config = write_mock_config(dir.path(), 0.0);
    let output = dir.path().join("out");

    markwise()
        .arg("evaluate")
        .arg("--answer-key")
        .arg(ANSWER_KEY)
        .arg("--submissions")
        .arg(SUBMISSIONS)
        .arg("--config")
        .arg(&config)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();
    let report = single_report(&output, "json");

    markwise()
        .arg("stats")
        .arg("--report")
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::contains("Students: 3"))
        .stdout(predicate::str::contains("Best: Asha Rao (21)"));

    markwise()
        .arg("stats")
        .arg("--report")
        .arg(&report)
        .arg("--format")
        .arg("json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_students\": 3"));
}

#[test]
fn stats_nonexistent_report() {
    markwise()
        .arg("stats")
        .arg("--report")
        .arg("no_such_file.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read report"));
}

#[test]
fn health_with_mock_scorer() {
    let dir = TempDir::new().unwrap();
    let config = write_mock_config(dir.path(), 0.0);

    markwise()
        .arg("health")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("mock scorer is up"));
}

#[test]
fn health_unreachable_server() {
    let dir = TempDir::new().unwrap();

    markwise()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .arg("health")
        .arg("--scorer-url")
        .arg("http://127.0.0.1:9")
        .assert()
        .failure()
        .stderr(predicate::str::contains("health check failed"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    markwise()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created markwise.toml"))
        .stdout(predicate::str::contains("Created answer-keys/example.toml"))
        .stdout(predicate::str::contains("Created submissions/example.toml"));

    assert!(dir.path().join("markwise.toml").exists());
    assert!(dir.path().join("answer-keys/example.toml").exists());
    assert!(dir.path().join("submissions/example.toml").exists());

    // The starter files are valid inputs.
    markwise()
        .current_dir(dir.path())
        .arg("validate")
        .arg("--answer-key")
        .arg("answer-keys/example.toml")
        .arg("--submissions")
        .arg("submissions/example.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("All inputs valid"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    // First init
    markwise()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    // Second init should skip
    markwise()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn help_output() {
    markwise()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Batch grader for free-text exam answers"));
}

#[test]
fn evaluate_help_describes_legacy_matching() {
    markwise()
        .arg("evaluate")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--legacy-matching"))
        .stdout(predicate::str::contains("no question-number matching"));
}

#[test]
fn version_output() {
    markwise()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("markwise"));
}
