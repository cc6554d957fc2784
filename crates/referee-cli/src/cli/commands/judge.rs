//! CLI command: referee judge
//!
//! Live-judge raw model outputs into judged outputs. Each matrix cell is one
//! NDJSON file; the judged counterpart is rewritten whole, so re-running a
//! cell after transient failures is safe.

use std::sync::Arc;

use tracing::{debug, info};

use referee_core::judge::Judge;
use referee_core::model::Response;
use referee_core::oracle::openai::OpenAiOracle;
use referee_core::store::{self, FileKey};

use crate::cli::args::JudgeArgs;
use crate::cli::helpers::{self, pick_langs, pick_modes};
use crate::exit_codes;

pub async fn run(args: JudgeArgs) -> anyhow::Result<i32> {
    let target = helpers::resolve(&args.common)?;
    target.matrix.model(&args.model)?;
    let langs = pick_langs(&target.matrix, &args.langs)?;
    let modes = pick_modes(&target.matrix, &args.modes)?;

    let oracle = OpenAiOracle::new(&args.judge_model, args.api_key);
    let judge = Judge::new(target.variant, Arc::new(oracle)).with_parallelism(args.parallel);

    let mut total_judged = 0usize;
    let mut total_failed = 0usize;

    for lang in &langs {
        let orders = if args.all_orders {
            store::orders_for_lang(target.variant, lang)
        } else {
            vec![target.variant.identity_order()]
        };
        for mode in &modes {
            for order in &orders {
                let key = FileKey::new(target.variant, lang, &args.model, mode, order.clone());
                let raw = target.root.raw_file(&key);
                let responses: Vec<Response> = store::read_lines_or_empty(&raw)?;
                if responses.is_empty() {
                    debug!(file = %raw.display(), "no raw outputs, skipping");
                    continue;
                }

                let batch = judge.judge_all(responses).await?;
                store::write_lines(&target.root.judged_file(&key), &batch.responses)?;
                info!(
                    file = %key,
                    judged = batch.judged,
                    failed = batch.failed,
                    "judged file written"
                );
                total_judged += batch.judged;
                total_failed += batch.failed;
            }
        }
    }

    info!(total_judged, total_failed, "judging run finished");
    Ok(if total_failed > 0 {
        exit_codes::RUNTIME_FAILURE
    } else {
        exit_codes::SUCCESS
    })
}
