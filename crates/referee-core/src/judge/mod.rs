//! The judging service.
//!
//! One Response is judged by two independent oracle calls (coarse strategy
//! classification, entity-mention extraction) whose outputs meet in the
//! fine-category resolver. The combination step is pure and shared with the
//! batch-result correlation path, which gets its oracle replies from a file
//! instead of a live call.

pub mod grounding;
pub mod prompt;
pub mod tables;

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::errors::OracleError;
use crate::model::{DatasetVariant, Entry, FineCategory, JudgeResponse, Response};
use crate::oracle::retry::RetryPolicy;
use crate::oracle::{CoarseVerdict, EntityMentions, JudgeOracle};

/// Default bound on in-flight oracle calls.
pub const DEFAULT_PARALLEL: usize = 8;

/// Combine the two oracle replies into a verdict. Shared by the live path
/// and batch-result correlation.
pub fn combine(
    entry: &Entry,
    verdict: CoarseVerdict,
    mentions: EntityMentions,
    variant: DatasetVariant,
) -> JudgeResponse {
    let grounded = grounding::ground_mentions(&mentions.mentioned_entities, entry);
    let (fine_category, correctness) = tables::resolve(
        verdict.category,
        grounded.pos_found,
        grounded.neg_found,
        variant,
    );

    if fine_category == FineCategory::Unknown {
        warn!(
            coarse = %verdict.category,
            pos_found = grounded.pos_found,
            neg_found = grounded.neg_found,
            question = %entry.question,
            "mention counts outside the lookup table"
        );
    }

    JudgeResponse {
        coarse_type: verdict.category,
        explanation: Some(verdict.explanation),
        mentioned_entities: grounded.mentioned_entities,
        pos_found: grounded.pos_found,
        neg_found: grounded.neg_found,
        fine_category,
        correctness,
    }
}

async fn judge_one(
    oracle: &dyn JudgeOracle,
    retry: &RetryPolicy,
    variant: DatasetVariant,
    response: &Response,
) -> Result<JudgeResponse, OracleError> {
    let entry = &response.entry;
    let entities = entry.entity_surfaces();

    let (verdict, mentions) = tokio::join!(
        retry.run("classify", || oracle
            .classify(&entry.question, &response.answer)),
        retry.run("extract", || oracle.extract(&entities, &response.answer)),
    );

    Ok(combine(entry, verdict?, mentions?, variant))
}

/// Outcome of a collection-level judging pass. Items that failed keep their
/// record (without a verdict) so file positions stay aligned with the raw
/// outputs; aggregation skips and counts them.
#[derive(Debug)]
pub struct JudgedBatch {
    pub responses: Vec<Response>,
    pub judged: usize,
    pub failed: usize,
}

pub struct Judge {
    variant: DatasetVariant,
    oracle: Arc<dyn JudgeOracle>,
    retry: RetryPolicy,
    parallel: usize,
}

impl Judge {
    pub fn new(variant: DatasetVariant, oracle: Arc<dyn JudgeOracle>) -> Self {
        Judge {
            variant,
            oracle,
            retry: RetryPolicy::default(),
            parallel: DEFAULT_PARALLEL,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_parallelism(mut self, parallel: usize) -> Self {
        self.parallel = parallel.max(1);
        self
    }

    pub fn variant(&self) -> DatasetVariant {
        self.variant
    }

    /// Judge one response. Classification and extraction run concurrently.
    pub async fn judge(&self, response: &Response) -> Result<JudgeResponse, OracleError> {
        judge_one(self.oracle.as_ref(), &self.retry, self.variant, response).await
    }

    /// Judge a whole collection, bounded by the parallelism limit. Oracle
    /// failures are contained to their item.
    pub async fn judge_all(&self, responses: Vec<Response>) -> anyhow::Result<JudgedBatch> {
        let total = responses.len();
        let sem = Arc::new(Semaphore::new(self.parallel));
        let mut join_set = JoinSet::new();

        for (idx, response) in responses.into_iter().enumerate() {
            let permit = sem.clone().acquire_owned().await?;
            let oracle = Arc::clone(&self.oracle);
            let retry = self.retry.clone();
            let variant = self.variant;
            join_set.spawn(async move {
                let _permit = permit;
                let verdict = judge_one(oracle.as_ref(), &retry, variant, &response).await;
                (idx, response, verdict)
            });
        }

        let mut slots: Vec<Option<Response>> = Vec::new();
        slots.resize_with(total, || None);
        let mut judged = 0usize;
        let mut failed = 0usize;

        while let Some(res) = join_set.join_next().await {
            match res {
                Ok((idx, mut response, Ok(verdict))) => {
                    response.judge_response = Some(verdict);
                    slots[idx] = Some(response);
                    judged += 1;
                }
                Ok((idx, response, Err(e))) => {
                    warn!(
                        index = idx,
                        error = %e,
                        question = %response.entry.question,
                        "judging failed, record kept without verdict"
                    );
                    slots[idx] = Some(response);
                    failed += 1;
                }
                Err(e) => {
                    warn!(error = %e, "judge task aborted");
                    failed += 1;
                }
            }
        }

        info!(total, judged, failed, "judging pass finished");

        Ok(JudgedBatch {
            responses: slots.into_iter().flatten().collect(),
            judged,
            failed,
        })
    }
}
