//! CLI command: referee ablate
//!
//! Positional-bias report over the shuffled-order judged outputs of one
//! model. Only languages that were generated under every permutation can be
//! ablated, which in the study matrix is English.

use tracing::debug;

use referee_core::model::{Permutation, Response};
use referee_core::stats::ablation::{self, AblationSlice};
use referee_core::store::{self, FileKey};

use crate::cli::args::AblateArgs;
use crate::cli::helpers::{self, pick_modes, write_report};
use crate::exit_codes;

pub fn run(args: AblateArgs) -> anyhow::Result<i32> {
    let target = helpers::resolve(&args.common)?;
    target.matrix.model(&args.model)?;
    target.matrix.language(&args.lang)?;
    let modes = pick_modes(&target.matrix, &args.modes)?;

    let mut slices = Vec::new();
    for order in Permutation::all(target.variant.entity_count()) {
        for mode in &modes {
            let key = FileKey::new(target.variant, &args.lang, &args.model, mode, order.clone());
            let responses: Vec<Response> =
                store::read_lines_or_empty(&target.root.judged_file(&key))?;
            if responses.is_empty() {
                debug!(file = %key, "no judged outputs for this order");
                continue;
            }
            slices.push(AblationSlice {
                mode: mode.clone(),
                order: order.clone(),
                responses,
            });
        }
    }

    let report = ablation::ablate(&slices, target.variant);
    write_report(&report, args.output.as_deref())?;
    Ok(exit_codes::SUCCESS)
}
