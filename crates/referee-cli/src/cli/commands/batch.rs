//! CLI commands: referee batch submit / status / parse / repair
//!
//! The batch flow is deferred judging: submit builds task files from the raw
//! outputs and creates jobs, status polls (and downloads), parse correlates
//! downloaded results back into judged outputs, repair re-runs individual
//! correlation ids live when a result came back broken.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use serde_json::Value;
use tracing::{debug, info, warn};

use referee_core::errors::ConfigError;
use referee_core::model::{DatasetVariant, Response};
use referee_core::oracle::batch::{self, BatchTask, TaskId, BATCH_ENDPOINT};
use referee_core::oracle::batch_client::BatchClient;
use referee_core::oracle::openai::OpenAiOracle;
use referee_core::oracle::retry::RetryPolicy;
use referee_core::oracle::JudgeOracle;
use referee_core::store::{self, DataRoot, FileKey};

use crate::cli::args::{BatchParseArgs, BatchRepairArgs, BatchStatusArgs, BatchSubmitArgs};
use crate::cli::helpers::{self, pick_langs, pick_models, pick_modes};
use crate::exit_codes;

pub async fn submit(args: BatchSubmitArgs) -> anyhow::Result<i32> {
    let target = helpers::resolve(&args.common)?;
    let models = pick_models(&target.matrix, &args.models)?;
    let langs = pick_langs(&target.matrix, &args.langs)?;
    let modes = pick_modes(&target.matrix, &args.modes)?;

    let mut coarse_tasks: Vec<BatchTask> = Vec::new();
    let mut entity_tasks: Vec<BatchTask> = Vec::new();

    for model in &models {
        for lang in &langs {
            for order in store::orders_for_lang(target.variant, lang) {
                for mode in &modes {
                    let key = FileKey::new(target.variant, lang, model, mode, order.clone());
                    let raw = target.root.raw_file(&key);
                    let responses: Vec<Response> = store::read_lines_or_empty(&raw)?;
                    if responses.is_empty() {
                        debug!(file = %raw.display(), "no raw outputs, skipping");
                        continue;
                    }

                    let file_key = key.relative_path();
                    if args.kind.wants_coarse() {
                        coarse_tasks.extend(batch::coarse_tasks_for_file(
                            &args.judge_model,
                            &file_key,
                            &responses,
                        )?);
                    }
                    if args.kind.wants_entity() {
                        entity_tasks.extend(batch::entity_tasks_for_file(
                            &args.judge_model,
                            &file_key,
                            &responses,
                        )?);
                    }
                }
            }
        }
    }

    let stamp = store::timestamp();
    let mut task_files: Vec<(&str, PathBuf)> = Vec::new();
    if !coarse_tasks.is_empty() {
        let path = target.root.coarse_task_file(&stamp);
        store::write_lines(&path, &coarse_tasks)?;
        info!(file = %path.display(), tasks = coarse_tasks.len(), "coarse task file written");
        task_files.push(("coarse", path));
    }
    if !entity_tasks.is_empty() {
        let path = target.root.entity_task_file(&stamp);
        store::write_lines(&path, &entity_tasks)?;
        info!(file = %path.display(), tasks = entity_tasks.len(), "entity task file written");
        task_files.push(("entity", path));
    }

    if task_files.is_empty() {
        warn!("no raw outputs found, nothing to submit");
        return Ok(exit_codes::SUCCESS);
    }
    if args.build_only {
        return Ok(exit_codes::SUCCESS);
    }

    let api_key = args
        .api_key
        .ok_or_else(|| ConfigError("OPENAI_API_KEY is not set".into()))?;
    let client = BatchClient::new(api_key);
    for (kind, path) in task_files {
        let job = client.submit(&path, BATCH_ENDPOINT).await?;
        info!(kind, job_id = %job.id, status = %job.status, "batch job created");
        println!("{} {}", kind, job.id);
    }
    Ok(exit_codes::SUCCESS)
}

pub async fn status(args: BatchStatusArgs) -> anyhow::Result<i32> {
    let client = BatchClient::new(args.api_key);
    let job = client.get_job(&args.job_id).await?;
    if let Some(counts) = &job.request_counts {
        info!(
            completed = counts.completed,
            failed = counts.failed,
            total = counts.total,
            "request counts"
        );
    }
    println!("{}", job.status);

    let Some(output) = &args.output else {
        return Ok(exit_codes::SUCCESS);
    };
    if !job.is_completed() {
        warn!(job_id = %job.id, status = %job.status, "job has no output to download yet");
        return Ok(exit_codes::RUNTIME_FAILURE);
    }
    let Some(file_id) = &job.output_file_id else {
        warn!(job_id = %job.id, "completed job carries no output file id");
        return Ok(exit_codes::RUNTIME_FAILURE);
    };

    let content = client.download_file(file_id).await?;
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    std::fs::write(output, content)
        .with_context(|| format!("failed to write {}", output.display()))?;
    info!(file = %output.display(), "batch output downloaded");
    Ok(exit_codes::SUCCESS)
}

pub fn parse(args: BatchParseArgs) -> anyhow::Result<i32> {
    let variant: DatasetVariant = args.variant.parse()?;
    let root = DataRoot::new(&args.data_root);

    let coarse_lines: Vec<Value> = store::read_lines(&args.coarse)?;
    let mut entity_lines: Vec<Value> = Vec::new();
    for path in &args.entity {
        entity_lines.extend(store::read_lines::<Value>(path)?);
    }

    // Source records for every file key the results reference.
    let mut sources: BTreeMap<String, Vec<Response>> = BTreeMap::new();
    for line in &coarse_lines {
        let Some(custom_id) = line.get("custom_id").and_then(Value::as_str) else {
            continue;
        };
        let Some(task) = TaskId::parse(custom_id) else {
            continue;
        };
        if !sources.contains_key(&task.file_key) {
            let responses = store::read_lines_or_empty(&root.raw_file_for(&task.file_key))?;
            sources.insert(task.file_key, responses);
        }
    }

    let correlated = batch::correlate_results(&coarse_lines, &entity_lines, &sources, variant);
    for (file_key, responses) in &correlated.files {
        store::write_lines(&root.judged_file_for(file_key), responses)?;
        info!(file = %file_key, records = responses.len(), "judged file written");
    }
    info!(
        matched = correlated.matched,
        skipped = correlated.skipped,
        "batch results correlated"
    );
    Ok(if correlated.skipped > 0 {
        exit_codes::RUNTIME_FAILURE
    } else {
        exit_codes::SUCCESS
    })
}

pub async fn repair(args: BatchRepairArgs) -> anyhow::Result<i32> {
    let root = DataRoot::new(&args.data_root);
    let oracle = OpenAiOracle::new(&args.judge_model, args.api_key);
    let retry = RetryPolicy::none();

    let output = args.output.unwrap_or_else(|| {
        root.raw_results_dir()
            .join(format!("repaired-entity-{}.jsonl", store::timestamp()))
    });

    let mut lines: Vec<Value> = Vec::new();
    let mut failed = 0usize;

    for id in &args.ids {
        let Some(task) = TaskId::parse(id) else {
            warn!(custom_id = %id, "not a valid correlation id, skipping");
            failed += 1;
            continue;
        };
        let responses: Vec<Response> =
            store::read_lines_or_empty(&root.raw_file_for(&task.file_key))?;
        let Some(response) = responses.get(task.index) else {
            warn!(custom_id = %id, "no source record at that index, skipping");
            failed += 1;
            continue;
        };

        let entities = response.entry.entity_surfaces();
        match retry
            .run("extract", || oracle.extract(&entities, &response.answer))
            .await
        {
            Ok(mentions) => {
                lines.push(batch::repaired_entity_line(id, &mentions));
            }
            Err(e) => {
                warn!(custom_id = %id, error = %e, "extraction failed");
                failed += 1;
            }
        }
    }

    if !lines.is_empty() {
        store::append_lines(&output, &lines)?;
        info!(file = %output.display(), repaired = lines.len(), "repaired results appended");
    }
    info!(repaired = lines.len(), failed, "repair finished");
    Ok(if failed > 0 {
        exit_codes::RUNTIME_FAILURE
    } else {
        exit_codes::SUCCESS
    })
}
