//! End-to-end flow: raw outputs on disk, a judging pass, the judged file,
//! aggregation. The oracle is scripted; everything else is the real path.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::json;
use tempfile::tempdir;

use referee_core::errors::OracleError;
use referee_core::model::{CoarseType, Entity, Entry, Response};
use referee_core::oracle::batch;
use referee_core::oracle::fake::FakeOracle;
use referee_core::stats::{self, ResponseStats};
use referee_core::store::{self, DataRoot, FileKey};
use referee_core::{DatasetVariant, Judge};

fn response(answer: &str) -> Response {
    Response {
        entry: Entry {
            question: "How fast can it fly?".into(),
            positive: vec![Entity {
                entity: "bee".into(),
                context: "The insect.".into(),
            }],
            negative: Entity {
                entity: "cheetah".into(),
                context: "The big cat.".into(),
            },
        },
        answer: answer.into(),
        conversation: vec![],
        judge_response: None,
    }
}

#[tokio::test]
async fn judging_persists_and_aggregates() {
    let dir = tempdir().unwrap();
    let root = DataRoot::new(dir.path());
    let variant = DatasetVariant::ClearRef;
    let key = FileKey::new(variant, "en", "gpt-4o", "normal", variant.identity_order());

    // Raw outputs as the generation step leaves them.
    let raw = vec![
        response("The bee flies at about 25 km/h."),
        response("Cheetahs cannot fly."),
        response("If you mean the bee, about 25 km/h; a cheetah cannot."),
        response("I cannot answer that."),
        response("It depends."),
    ];
    store::write_lines(&root.raw_file(&key), &raw).unwrap();

    // Scripted verdicts, consumed one item at a time. The last item fails
    // permanently and keeps its record without a verdict.
    let oracle = FakeOracle::new()
        .with_verdict(CoarseType::AnswerAttempt, "names the bee")
        .with_mentions(&["bee"])
        .with_verdict(CoarseType::AnswerAttempt, "names the cheetah")
        .with_mentions(&["cheetah"])
        .with_verdict(CoarseType::Hedge, "covers both readings")
        .with_mentions(&["bee", "cheetah"])
        .with_verdict(CoarseType::Refuse, "declined")
        .with_mentions(&[])
        .with_verdict_error(OracleError::Rejected {
            status: 401,
            detail: "bad key".into(),
        })
        .with_mentions(&[]);
    let judge = Judge::new(variant, Arc::new(oracle)).with_parallelism(1);

    let loaded: Vec<Response> = store::read_lines(&root.raw_file(&key)).unwrap();
    let judged_batch = judge.judge_all(loaded).await.unwrap();
    assert_eq!(judged_batch.judged, 4);
    assert_eq!(judged_batch.failed, 1);

    store::write_lines(&root.judged_file(&key), &judged_batch.responses).unwrap();
    let judged: Vec<Response> = store::read_lines(&root.judged_file(&key)).unwrap();
    assert_eq!(judged, judged_batch.responses);

    let run = ResponseStats::collect(&judged, &variant.identity_order());
    assert_eq!(run.judged, 4);
    assert_eq!(run.skipped, 1);
    assert_eq!(run.correct.count.get("Correct"), Some(&2));
    assert_eq!(run.correct.percentage.get("Correct"), Some(&50.0));
    assert_eq!(run.fine_category.count.get("Direct"), Some(&1));
    assert_eq!(run.fine_category.percentage.get("Negative"), Some(&25.0));
    assert_eq!(run.coarse_type.count.get("answer_attempt"), Some(&2));
    assert_eq!(run.correct_coarse.count.get("answer_attempt"), Some(&1));
    assert_eq!(run.correct_coarse.count.get("hedge"), Some(&1));
    assert_eq!(run.direct_coarse.count.get("answer_attempt"), Some(&1));

    // Mention tallies key by surface form and by in-prompt position.
    assert_eq!(run.entity_counters.count.total.get("bee"), Some(&2));
    assert_eq!(run.entity_counters.count.correct.get("bee"), Some(&2));
    assert_eq!(run.entity_counters.count.correct.get("cheetah"), Some(&1));
    assert_eq!(run.entity_counters.count.wrong.get("cheetah"), Some(&1));
    assert_eq!(run.entity_counters.count.wrong.get("bee"), Some(&0));
    assert_eq!(run.pos_counters.count.total.get("pos_0"), Some(&2));
    assert_eq!(run.pos_counters.count.total.get("pos_1"), Some(&2));

    let summary = stats::summarize_runs([&run, &run]);
    assert_eq!(summary.correct, 50.0);
    assert_eq!(summary.direct, 25.0);
    assert_eq!(summary.correct_direct.mean, 50.0);
    assert_eq!(summary.correct_direct.variance, Some(0.0));
    assert_eq!(summary.coarse_shares.get("refuse"), Some(&25.0));
}

#[tokio::test]
async fn batch_correlation_matches_live_judging() {
    let variant = DatasetVariant::ClearRef;
    let item = response("The bee flies at about 25 km/h.");

    let oracle = FakeOracle::new()
        .with_verdict(CoarseType::AnswerAttempt, "names the bee")
        .with_mentions(&["bee"]);
    let judge = Judge::new(variant, Arc::new(oracle));
    let live = judge.judge(&item).await.unwrap();

    // The same replies, arriving through downloaded result files.
    let file_key = "clear_ref/en/gpt-4o/outputs-clear_ref-en-gpt-4o-normal-01.jsonl";
    let id = batch::task_custom_id(file_key, 0);
    let coarse_text = json!({"explanation": "names the bee", "category": "answer_attempt"});
    let entity_text = json!({"explanation": "e", "mentioned_entities": ["bee"]});
    let coarse_line = json!({
        "custom_id": id,
        "response": {"body": {"output": [{"content": [{"type": "output_text", "text": coarse_text.to_string()}]}]}}
    });
    let entity_line = json!({
        "custom_id": id,
        "response": {"body": {"output": [{"content": [{"type": "output_text", "text": entity_text.to_string()}]}]}}
    });

    let mut sources = BTreeMap::new();
    sources.insert(file_key.to_string(), vec![item]);
    let out = batch::correlate_results(&[coarse_line], &[entity_line], &sources, variant);

    assert_eq!(out.matched, 1);
    assert_eq!(out.skipped, 0);
    let from_batch = out.files[file_key][0].judge_response.as_ref().unwrap();
    assert_eq!(from_batch, &live);
}
