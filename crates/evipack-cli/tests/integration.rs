//! Integration tests for CLI commands.

use std::path::Path;
use std::process::Command;

use serde_json::json;
use tempfile::TempDir;

use evipack_container::ContainerBuilder;
use evipack_core::{Keypair, SessionId, StepRecord, WorkflowName};

fn run_cli(args: &[&str]) -> (bool, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_evipack"))
        .args(args)
        .output()
        .expect("Failed to execute CLI");

    let stdout = String::from_utf8(output.stdout).unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();
    let success = output.status.success();

    (success, stdout, stderr)
}

fn write_container(path: &Path, keypair: Option<&Keypair>) {
    ContainerBuilder::new(
        SessionId::parse("trace-1").unwrap(),
        WorkflowName::parse("demo-workflow").unwrap(),
    )
        .step(StepRecord::new("session.start", json!({})))
        .step(StepRecord::new("llm.request", json!({"model": "m-1"})))
        .step(StepRecord::new("session.end", json!({})))
        .goal("exercise the CLI")
        .write(path, keypair)
        .unwrap();
}

#[test]
fn verify_signed_container_passes() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("signed.epi");
    write_container(&path, Some(&Keypair::generate()));

    let (success, stdout, _) = run_cli(&["verify", temp_dir.path().to_str().unwrap()]);
    assert!(success);
    assert!(stdout.contains("VERIFIED"));
    assert!(stdout.contains("verified: 1"));
}

#[test]
fn verify_unsigned_passes_by_default_and_fails_under_policy() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("unsigned.epi");
    write_container(&path, None);

    let dir = temp_dir.path().to_str().unwrap();

    let (success, stdout, _) = run_cli(&["verify", dir]);
    assert!(success);
    assert!(stdout.contains("UNSIGNED"));

    let (success, stdout, _) = run_cli(&["verify", dir, "--fail-on-unsigned"]);
    assert!(!success);
    assert!(stdout.contains("FAIL"));
}

#[test]
fn verify_tampered_container_fails() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("junk.epi"), b"not a zip").unwrap();

    let dir = temp_dir.path().to_str().unwrap();

    let (success, stdout, _) = run_cli(&["verify", dir]);
    assert!(!success);
    assert!(stdout.contains("TAMPERED"));

    // Advisory mode still reports, but exits zero.
    let (success, stdout, _) = run_cli(&["verify", dir, "--no-fail-on-tampered"]);
    assert!(success);
    assert!(stdout.contains("TAMPERED"));
}

#[test]
fn verify_json_output_is_parseable() {
    let temp_dir = TempDir::new().unwrap();
    write_container(&temp_dir.path().join("a.epi"), None);

    let (success, stdout, _) =
        run_cli(&["verify", temp_dir.path().to_str().unwrap(), "--json"]);
    assert!(success);

    let value: serde_json::Value = serde_json::from_str(&stdout).expect("Invalid JSON");
    assert_eq!(value["total"], 1);
    assert_eq!(value["unsigned"], 1);
    assert_eq!(value["result"], "pass");
}

#[test]
fn verify_empty_path_passes() {
    let temp_dir = TempDir::new().unwrap();
    let (success, stdout, _) = run_cli(&["verify", temp_dir.path().to_str().unwrap()]);
    assert!(success);
    assert!(stdout.contains("No .epi containers found"));
}

#[test]
fn inspect_shows_manifest_summary() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("inspect.epi");
    write_container(&path, None);

    let (success, stdout, _) = run_cli(&["inspect", path.to_str().unwrap()]);
    assert!(success);
    assert!(stdout.contains("trace-1"));
    assert!(stdout.contains("demo-workflow"));
    assert!(stdout.contains("manifest.json"));
    assert!(stdout.contains("steps.jsonl"));
}

#[test]
fn list_prints_step_records() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("list.epi");
    write_container(&path, None);

    let (success, stdout, _) = run_cli(&["list", path.to_str().unwrap()]);
    assert!(success);
    assert!(stdout.contains("KIND"));
    assert!(stdout.contains("llm.request"));

    let (success, stdout, _) = run_cli(&["list", path.to_str().unwrap(), "--json"]);
    assert!(success);
    for line in stdout.lines().filter(|l| !l.is_empty()) {
        serde_json::from_str::<serde_json::Value>(line).expect("Invalid JSON");
    }

    let (success, stdout, _) =
        run_cli(&["list", path.to_str().unwrap(), "--max-steps", "1"]);
    assert!(success);
    assert!(!stdout.contains("llm.request"));
}

#[test]
fn keygen_pack_verify_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let key_path = temp_dir.path().join("signer.key");
    let steps_path = temp_dir.path().join("steps.jsonl");
    let out_path = temp_dir.path().join("packed.epi");

    let (success, _, _) = run_cli(&["keygen", "--out", key_path.to_str().unwrap()]);
    assert!(success);
    let secret = std::fs::read_to_string(&key_path).unwrap();

    let step = StepRecord::new("llm.request", json!({"model": "m-1"}));
    std::fs::write(&steps_path, format!("{}\n", serde_json::to_string(&step).unwrap())).unwrap();

    let (success, stdout, _) = run_cli(&[
        "pack",
        steps_path.to_str().unwrap(),
        "--out",
        out_path.to_str().unwrap(),
        "--session",
        "manual-1",
        "--sign-key",
        secret.trim(),
    ]);
    assert!(success);
    assert!(stdout.contains("signed"));

    let (success, stdout, _) = run_cli(&[
        "verify",
        out_path.to_str().unwrap(),
        "--fail-on-unsigned",
    ]);
    assert!(success);
    assert!(stdout.contains("VERIFIED"));
}
