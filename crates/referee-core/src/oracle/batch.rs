//! Deferred judging over the batch API.
//!
//! Task files are NDJSON, one request per line, each carrying a correlation
//! id of the form `task-{file_key}-{index}` where `file_key` is the relative
//! path of the raw outputs file and `index` the zero-based line number in
//! it. Results come back keyed by that id and are correlated here into
//! judged records. A missing or unreadable result leaves a gap: the item is
//! skipped and counted, never fatal.

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::errors::OracleError;
use crate::judge;
use crate::judge::prompt;
use crate::model::{DatasetVariant, Response};

use super::{
    coarse_schema, mentions_schema, parse_reply, request_body, CoarseVerdict, EntityMentions,
    COARSE_SCHEMA_NAME, MENTIONS_SCHEMA_NAME,
};

pub const BATCH_ENDPOINT: &str = "/v1/responses";

/// One line of a batch task file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchTask {
    pub custom_id: String,
    pub method: String,
    pub url: String,
    pub body: Value,
}

/// Correlation id parts: which raw outputs file, which line in it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId {
    pub file_key: String,
    pub index: usize,
}

pub fn task_custom_id(file_key: &str, index: usize) -> String {
    format!("task-{}-{}", file_key, index)
}

impl TaskId {
    /// Greedy stem, trailing integer: the file key itself contains dashes.
    pub fn parse(custom_id: &str) -> Option<TaskId> {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| Regex::new(r"^task-(.*)-(\d+)$").unwrap());
        let caps = re.captures(custom_id)?;
        let file_key = caps.get(1)?.as_str().to_string();
        let index = caps.get(2)?.as_str().parse().ok()?;
        Some(TaskId { file_key, index })
    }

    pub fn custom_id(&self) -> String {
        task_custom_id(&self.file_key, self.index)
    }
}

pub fn coarse_task(
    model: &str,
    file_key: &str,
    index: usize,
    response: &Response,
) -> Result<BatchTask, OracleError> {
    let input = prompt::coarse_type_instructions(&response.entry.question, &response.answer);
    let body = request_body(model, &input, COARSE_SCHEMA_NAME, coarse_schema())?;
    Ok(BatchTask {
        custom_id: task_custom_id(file_key, index),
        method: "POST".to_string(),
        url: BATCH_ENDPOINT.to_string(),
        body,
    })
}

pub fn entity_task(
    model: &str,
    file_key: &str,
    index: usize,
    response: &Response,
) -> Result<BatchTask, OracleError> {
    let entities = response.entry.entity_surfaces();
    let input = prompt::mentioned_entities_instructions(&entities, &response.answer);
    let body = request_body(model, &input, MENTIONS_SCHEMA_NAME, mentions_schema())?;
    Ok(BatchTask {
        custom_id: task_custom_id(file_key, index),
        method: "POST".to_string(),
        url: BATCH_ENDPOINT.to_string(),
        body,
    })
}

pub fn coarse_tasks_for_file(
    model: &str,
    file_key: &str,
    responses: &[Response],
) -> Result<Vec<BatchTask>, OracleError> {
    responses
        .iter()
        .enumerate()
        .map(|(idx, r)| coarse_task(model, file_key, idx, r))
        .collect()
}

pub fn entity_tasks_for_file(
    model: &str,
    file_key: &str,
    responses: &[Response],
) -> Result<Vec<BatchTask>, OracleError> {
    responses
        .iter()
        .enumerate()
        .map(|(idx, r)| entity_task(model, file_key, idx, r))
        .collect()
}

/// Decode the reply carried by one result line. Regular results nest the
/// payload under `response.body`; repaired results carry the reply object
/// directly under `response`.
pub fn parse_result_line<T: DeserializeOwned>(line: &Value) -> Result<T, OracleError> {
    let response = line
        .get("response")
        .ok_or_else(|| OracleError::MalformedPayload {
            detail: "result line has no response field".to_string(),
        })?;
    match response.get("body") {
        Some(body) => parse_reply(body),
        None => {
            serde_json::from_value(response.clone()).map_err(|e| OracleError::MalformedPayload {
                detail: format!("result reply is not the promised JSON: {}", e),
            })
        }
    }
}

/// A repaired result line, appended to a downloaded entity result file to
/// fill a gap.
pub fn repaired_entity_line(custom_id: &str, mentions: &EntityMentions) -> Value {
    json!({"custom_id": custom_id, "response": mentions})
}

/// Judged records from one correlation pass, grouped by source file key and
/// ordered by source line index.
#[derive(Debug, Default)]
pub struct CorrelatedResults {
    pub files: BTreeMap<String, Vec<Response>>,
    pub matched: usize,
    pub skipped: usize,
}

/// Join downloaded coarse and entity result lines with the raw records they
/// were generated from. `sources` maps file key to the raw outputs file's
/// records in line order.
pub fn correlate_results(
    coarse_lines: &[Value],
    entity_lines: &[Value],
    sources: &BTreeMap<String, Vec<Response>>,
    variant: DatasetVariant,
) -> CorrelatedResults {
    let entity_by_id: HashMap<&str, &Value> = entity_lines
        .iter()
        .filter_map(|l| Some((l.get("custom_id")?.as_str()?, l)))
        .collect();

    let mut grouped: BTreeMap<String, Vec<(usize, Response)>> = BTreeMap::new();
    let mut matched = 0usize;
    let mut skipped = 0usize;

    for line in coarse_lines {
        let Some(custom_id) = line.get("custom_id").and_then(Value::as_str) else {
            warn!("batch result line has no custom_id, skipping");
            skipped += 1;
            continue;
        };
        let Some(task) = TaskId::parse(custom_id) else {
            warn!(custom_id, "unparseable correlation id, skipping");
            skipped += 1;
            continue;
        };

        let verdict: CoarseVerdict = match parse_result_line(line) {
            Ok(v) => v,
            Err(e) => {
                warn!(custom_id, error = %e, "unreadable coarse result, skipping");
                skipped += 1;
                continue;
            }
        };

        let Some(entity_line) = entity_by_id.get(custom_id) else {
            warn!(custom_id, "no entity result for id, skipping");
            skipped += 1;
            continue;
        };
        let mentions: EntityMentions = match parse_result_line(entity_line) {
            Ok(m) => m,
            Err(e) => {
                warn!(custom_id, error = %e, "unreadable entity result, skipping");
                skipped += 1;
                continue;
            }
        };

        let Some(source) = sources.get(&task.file_key) else {
            warn!(file_key = %task.file_key, "no source records for file key, skipping");
            skipped += 1;
            continue;
        };
        let Some(original) = source.get(task.index) else {
            warn!(
                custom_id,
                index = task.index,
                "source index out of range, skipping"
            );
            skipped += 1;
            continue;
        };

        let mut judged = original.clone();
        judged.judge_response = Some(judge::combine(&judged.entry, verdict, mentions, variant));
        grouped
            .entry(task.file_key)
            .or_default()
            .push((task.index, judged));
        matched += 1;
    }

    let mut files = BTreeMap::new();
    for (key, mut items) in grouped {
        items.sort_by_key(|(idx, _)| *idx);
        files.insert(key, items.into_iter().map(|(_, r)| r).collect());
    }

    CorrelatedResults {
        files,
        matched,
        skipped,
    }
}
