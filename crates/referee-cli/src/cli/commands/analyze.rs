//! CLI command: referee analyze
//!
//! Per-model aggregation over judged outputs at the identity entity order:
//! per-language per-mode stats plus a cross-language summary per mode.

use std::collections::BTreeMap;

use serde_json::json;

use referee_core::model::Response;
use referee_core::stats::{self, ModeSummary, ResponseStats};
use referee_core::store::{self, FileKey};

use crate::cli::args::AnalyzeArgs;
use crate::cli::helpers::{self, pick_langs, pick_models, pick_modes, write_report};
use crate::exit_codes;

pub fn run(args: AnalyzeArgs) -> anyhow::Result<i32> {
    let target = helpers::resolve(&args.common)?;
    let models = pick_models(&target.matrix, &args.models)?;
    let langs = pick_langs(&target.matrix, &args.langs)?;
    let modes = pick_modes(&target.matrix, &args.modes)?;
    let identity = target.variant.identity_order();

    let mut report = serde_json::Map::new();
    for model in &models {
        let mut per_lang: BTreeMap<String, BTreeMap<String, ResponseStats>> = BTreeMap::new();
        for lang in &langs {
            let mut per_mode = BTreeMap::new();
            for mode in &modes {
                let key = FileKey::new(target.variant, lang, model, mode, identity.clone());
                let responses: Vec<Response> =
                    store::read_lines_or_empty(&target.root.judged_file(&key))?;
                per_mode.insert(mode.clone(), ResponseStats::collect(&responses, &identity));
            }
            per_lang.insert(lang.clone(), per_mode);
        }

        let mut summary: BTreeMap<String, ModeSummary> = BTreeMap::new();
        for mode in &modes {
            let runs = langs
                .iter()
                .filter_map(|lang| per_lang.get(lang).and_then(|m| m.get(mode)));
            summary.insert(mode.clone(), stats::summarize_runs(runs));
        }

        report.insert(
            model.clone(),
            json!({
                "languages": per_lang,
                "summary": summary,
            }),
        );
    }

    write_report(&report, args.output.as_deref())?;
    Ok(exit_codes::SUCCESS)
}
