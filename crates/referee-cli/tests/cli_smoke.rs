use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const RAW_KEY: &str = "clear_ref/en/gpt-4o/outputs-clear_ref-en-gpt-4o-normal-01.jsonl";

fn referee() -> Command {
    Command::cargo_bin("referee").unwrap()
}

/// One raw output record: an answer that names the positive entity only.
fn seed_raw_output(root: &Path) {
    let record = json!({
        "entry": {
            "question": "How fast can it fly?",
            "positive": [{"entity": "bee", "context": "The insect."}],
            "negative": {"entity": "cheetah", "context": "The big cat."},
        },
        "answer": "The bee flies at about 25 km/h.",
        "conversation": [],
    });
    let path = root.join("outputs").join(RAW_KEY);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, format!("{}\n", record)).unwrap();
}

fn result_line(custom_id: &str, reply: &Value) -> String {
    json!({
        "custom_id": custom_id,
        "response": {"body": {"output": [{"content": [{"type": "output_text", "text": reply.to_string()}]}]}}
    })
    .to_string()
}

#[test]
fn version_prints_package_version() {
    referee()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn unknown_variant_is_a_config_error() {
    let dir = tempdir().unwrap();
    referee()
        .args(["analyze", "--data-root"])
        .arg(dir.path())
        .args(["--variant", "bogus"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown dataset variant"));
}

#[test]
fn judge_without_an_api_key_is_a_usage_error() {
    let dir = tempdir().unwrap();
    referee()
        .env_remove("OPENAI_API_KEY")
        .args(["judge", "--data-root"])
        .arg(dir.path())
        .args(["--variant", "clear_ref", "--model", "gpt-4o"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--api-key"));
}

#[test]
fn analyze_on_an_empty_root_reports_zero_judged() {
    let dir = tempdir().unwrap();
    let output = referee()
        .args(["analyze", "--data-root"])
        .arg(dir.path())
        .args([
            "--variant",
            "clear_ref",
            "--models",
            "gpt-4o",
            "--langs",
            "en",
            "--modes",
            "normal",
        ])
        .assert()
        .success()
        .get_output()
        .clone();

    let report: Value = serde_json::from_slice(&output.stdout).expect("report must be JSON");
    assert_eq!(report["gpt-4o"]["languages"]["en"]["normal"]["judged"], 0);
    assert_eq!(report["gpt-4o"]["summary"]["normal"]["correct"], 0.0);
}

#[test]
fn batch_submit_build_only_writes_task_files_offline() {
    let dir = tempdir().unwrap();
    seed_raw_output(dir.path());

    referee()
        .env_remove("OPENAI_API_KEY")
        .args(["batch", "submit", "--data-root"])
        .arg(dir.path())
        .args([
            "--variant",
            "clear_ref",
            "--models",
            "gpt-4o",
            "--langs",
            "en",
            "--modes",
            "normal",
            "--build-only",
        ])
        .assert()
        .success();

    let inputs_dir = dir.path().join("judge-inputs");
    let mut names: Vec<String> = fs::read_dir(&inputs_dir)
        .expect("judge-inputs missing")
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names.len(), 2, "expected coarse + entity task files");
    assert!(names[0].starts_with("coarse-judge-input-") && names[0].ends_with(".jsonl"));
    assert!(names[1].starts_with("entity-judge-input-") && names[1].ends_with(".jsonl"));

    let coarse = fs::read_to_string(inputs_dir.join(&names[0])).unwrap();
    let task: Value = serde_json::from_str(coarse.lines().next().unwrap()).unwrap();
    assert_eq!(task["custom_id"], format!("task-{}-0", RAW_KEY));
    assert_eq!(task["url"], "/v1/responses");
    assert_eq!(task["body"]["text"]["format"]["name"], "ResponseCategory");
}

#[test]
fn batch_parse_correlates_results_into_judged_outputs() {
    let dir = tempdir().unwrap();
    seed_raw_output(dir.path());

    let id = format!("task-{}-0", RAW_KEY);
    let coarse_path = dir.path().join("coarse-results.jsonl");
    let entity_path = dir.path().join("entity-results.jsonl");
    fs::write(
        &coarse_path,
        result_line(&id, &json!({"explanation": "e", "category": "answer_attempt"})),
    )
    .unwrap();
    fs::write(
        &entity_path,
        result_line(&id, &json!({"explanation": "e", "mentioned_entities": ["bee"]})),
    )
    .unwrap();

    referee()
        .args(["batch", "parse", "--data-root"])
        .arg(dir.path())
        .args(["--variant", "clear_ref", "--coarse"])
        .arg(&coarse_path)
        .arg("--entity")
        .arg(&entity_path)
        .assert()
        .success();

    let judged_path = dir.path().join("judged_outputs").join(RAW_KEY);
    let judged = fs::read_to_string(&judged_path).expect("judged file missing");
    let record: Value = serde_json::from_str(judged.lines().next().unwrap()).unwrap();
    let verdict = &record["judge_response"];
    assert_eq!(verdict["coarse_type"], "answer_attempt");
    assert_eq!(verdict["fine_category"], "Direct");
    assert_eq!(verdict["correctness"], "Correct");
    assert_eq!(verdict["mentioned_entities"], json!(["bee"]));
}

#[test]
fn batch_parse_flags_gaps_but_keeps_complete_files() {
    let dir = tempdir().unwrap();
    seed_raw_output(dir.path());

    // Coarse result present, entity result missing: the item is a gap.
    let id = format!("task-{}-0", RAW_KEY);
    let coarse_path = dir.path().join("coarse-results.jsonl");
    let entity_path = dir.path().join("entity-results.jsonl");
    fs::write(
        &coarse_path,
        result_line(&id, &json!({"explanation": "e", "category": "answer_attempt"})),
    )
    .unwrap();
    fs::write(&entity_path, "").unwrap();

    referee()
        .args(["batch", "parse", "--data-root"])
        .arg(dir.path())
        .args(["--variant", "clear_ref", "--coarse"])
        .arg(&coarse_path)
        .arg("--entity")
        .arg(&entity_path)
        .assert()
        .code(1);

    assert!(!dir.path().join("judged_outputs").join(RAW_KEY).exists());
}
