//! Aggregation over judged responses.
//!
//! Everything here is a pure reduction: counts per label, the same counts
//! as percentages, and mention tallies keyed two ways (by original entity
//! index and by prompt position). Percentages are always derived from the
//! count maps they sit next to, never accumulated on their own.

pub mod ablation;

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::model::{Correctness, FineCategory, Permutation, Response};

/// Counts scaled to percent of their own total, rounded to 2 decimals.
/// An empty map (total 0) maps every key to 0 instead of dividing.
pub fn percentages(counts: &BTreeMap<String, u64>) -> BTreeMap<String, f64> {
    let total: u64 = counts.values().sum();
    counts
        .iter()
        .map(|(key, value)| {
            let pct = if total > 0 {
                round2(*value as f64 / total as f64 * 100.0)
            } else {
                0.0
            };
            (key.clone(), pct)
        })
        .collect()
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// A count distribution and its percentage view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tally {
    pub count: BTreeMap<String, u64>,
    pub percentage: BTreeMap<String, f64>,
}

impl Tally {
    pub fn from_counts(count: BTreeMap<String, u64>) -> Self {
        let percentage = percentages(&count);
        Self { count, percentage }
    }
}

/// Mention counts split by the verdict of the response they came from.
/// `part` and `wrong` mirror `correct`; everything lands in `total`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MentionBuckets<T> {
    pub total: BTreeMap<String, T>,
    pub correct: BTreeMap<String, T>,
    pub part: BTreeMap<String, T>,
    pub wrong: BTreeMap<String, T>,
}

impl MentionBuckets<u64> {
    /// Record one entity under `key`. `mentioned` is 0 or 1; a zero still
    /// materializes the key so absent entities show up as explicit zeros.
    fn add(&mut self, correctness: Correctness, key: &str, mentioned: u64) {
        *self.total.entry(key.to_string()).or_insert(0) += mentioned;
        let bucket = match correctness {
            Correctness::Correct => &mut self.correct,
            Correctness::PartiallyCorrect => &mut self.part,
            Correctness::Wrong => &mut self.wrong,
            _ => return,
        };
        *bucket.entry(key.to_string()).or_insert(0) += mentioned;
    }

    pub fn merge(&mut self, other: &Self) {
        merge_counts(&mut self.total, &other.total);
        merge_counts(&mut self.correct, &other.correct);
        merge_counts(&mut self.part, &other.part);
        merge_counts(&mut self.wrong, &other.wrong);
    }

    fn as_percentages(&self) -> MentionBuckets<f64> {
        MentionBuckets {
            total: percentages(&self.total),
            correct: percentages(&self.correct),
            part: percentages(&self.part),
            wrong: percentages(&self.wrong),
        }
    }
}

fn merge_counts(into: &mut BTreeMap<String, u64>, from: &BTreeMap<String, u64>) {
    for (key, value) in from {
        *into.entry(key.clone()).or_insert(0) += value;
    }
}

/// Mention buckets plus their percentage view. Each bucket is converted
/// over its own total, so `correct` percentages say which entities correct
/// answers mention, not how often answers are correct.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MentionTally {
    pub count: MentionBuckets<u64>,
    pub percentage: MentionBuckets<f64>,
}

impl MentionTally {
    pub fn from_counts(count: MentionBuckets<u64>) -> Self {
        let percentage = count.as_percentages();
        Self { count, percentage }
    }
}

/// Full aggregation over one homogeneous collection of judged responses.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseStats {
    /// Responses carrying a verdict.
    pub judged: u64,
    /// Responses without a verdict, excluded from every tally.
    pub skipped: u64,
    pub correct: Tally,
    pub coarse_type: Tally,
    pub fine_category: Tally,
    /// Coarse-type distribution within responses judged Correct.
    pub correct_coarse: Tally,
    /// Coarse-type distribution within responses resolved as Direct.
    pub direct_coarse: Tally,
    /// Joint distribution keyed `coarse/fine/correctness`.
    pub total: Tally,
    /// Mentions keyed by original entity index (`entity_0`, `entity_1`, ...).
    pub entity_counters: MentionTally,
    /// Mentions keyed by prompt position (`pos_0`, `pos_1`, ...), recovered
    /// through the permutation the responses were collected under.
    pub pos_counters: MentionTally,
}

impl ResponseStats {
    pub fn collect<'a, I>(responses: I, permutation: &Permutation) -> Self
    where
        I: IntoIterator<Item = &'a Response>,
    {
        let mut judged = 0u64;
        let mut skipped = 0u64;
        let mut correct = BTreeMap::new();
        let mut coarse = BTreeMap::new();
        let mut fine = BTreeMap::new();
        let mut correct_coarse = BTreeMap::new();
        let mut direct_coarse = BTreeMap::new();
        let mut joint = BTreeMap::new();
        let mut entity_buckets = MentionBuckets::default();
        let mut pos_buckets = MentionBuckets::default();

        for response in responses {
            let Some(judge) = &response.judge_response else {
                skipped += 1;
                continue;
            };
            judged += 1;

            bump(&mut correct, judge.correctness.as_str());
            bump(&mut coarse, judge.coarse_type.as_str());
            bump(&mut fine, judge.fine_category.as_str());
            bump(
                &mut joint,
                &format!(
                    "{}/{}/{}",
                    judge.coarse_type, judge.fine_category, judge.correctness
                ),
            );
            if judge.correctness == Correctness::Correct {
                bump(&mut correct_coarse, judge.coarse_type.as_str());
            }
            if judge.fine_category == FineCategory::Direct {
                bump(&mut direct_coarse, judge.coarse_type.as_str());
            }

            // Mention tallies compare canonical (lower-cased) surfaces, the
            // form grounding stores in `mentioned_entities`.
            let mut entities = response.entry.canonical_positives();
            entities.push(response.entry.canonical_negative());
            for (idx, entity) in entities.iter().enumerate() {
                let mentioned = u64::from(judge.mentioned_entities.iter().any(|m| m == entity));
                entity_buckets.add(judge.correctness, &format!("entity_{idx}"), mentioned);
                match permutation.position_of(idx) {
                    Some(pos) => {
                        pos_buckets.add(judge.correctness, &format!("pos_{pos}"), mentioned);
                    }
                    None => warn!(
                        index = idx,
                        order = %permutation,
                        "entity index not in order, position tally skipped"
                    ),
                }
            }
        }

        if skipped > 0 {
            warn!(skipped, "responses without a verdict excluded from stats");
        }

        Self {
            judged,
            skipped,
            correct: Tally::from_counts(correct),
            coarse_type: Tally::from_counts(coarse),
            fine_category: Tally::from_counts(fine),
            correct_coarse: Tally::from_counts(correct_coarse),
            direct_coarse: Tally::from_counts(direct_coarse),
            total: Tally::from_counts(joint),
            entity_counters: MentionTally::from_counts(entity_buckets),
            pos_counters: MentionTally::from_counts(pos_buckets),
        }
    }
}

fn bump(counts: &mut BTreeMap<String, u64>, key: &str) {
    *counts.entry(key.to_string()).or_insert(0) += 1;
}

/// Mean and sample variance over per-run values. Variance uses the n-1
/// divisor and is absent for fewer than two samples, never 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    pub mean: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variance: Option<f64>,
}

impl MetricSummary {
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self {
                mean: 0.0,
                variance: None,
            };
        }
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = if samples.len() > 1 {
            let ss: f64 = samples.iter().map(|x| (x - mean).powi(2)).sum();
            Some(ss / (n - 1.0))
        } else {
            None
        };
        Self { mean, variance }
    }
}

/// Headline metrics for one mode, averaged over repeated runs (one stats
/// object per run, e.g. one per language).
#[derive(Debug, Clone, Serialize)]
pub struct ModeSummary {
    /// Mean percentage of responses judged Correct.
    pub correct: f64,
    /// Mean percentage of responses resolved as Direct.
    pub direct: f64,
    /// Direct count as a percentage of Correct count, with variance across
    /// runs.
    pub correct_direct: MetricSummary,
    /// Mean share of each coarse type.
    pub coarse_shares: BTreeMap<String, f64>,
}

pub fn summarize_runs<'a, I>(runs: I) -> ModeSummary
where
    I: IntoIterator<Item = &'a ResponseStats>,
{
    let mut correct_vals = Vec::new();
    let mut direct_vals = Vec::new();
    let mut correct_direct_vals = Vec::new();
    let mut coarse_sums: BTreeMap<String, f64> = BTreeMap::new();
    let mut n = 0usize;

    for run in runs {
        n += 1;
        correct_vals.push(run.correct.percentage.get("Correct").copied().unwrap_or(0.0));
        direct_vals.push(
            run.fine_category
                .percentage
                .get("Direct")
                .copied()
                .unwrap_or(0.0),
        );

        let direct_count = run.fine_category.count.get("Direct").copied().unwrap_or(0);
        let correct_count = run.correct.count.get("Correct").copied().unwrap_or(1).max(1);
        correct_direct_vals.push(direct_count as f64 / correct_count as f64 * 100.0);

        for (label, share) in &run.coarse_type.percentage {
            *coarse_sums.entry(label.clone()).or_insert(0.0) += share;
        }
    }

    let divisor = n.max(1) as f64;
    for share in coarse_sums.values_mut() {
        *share /= divisor;
    }

    ModeSummary {
        correct: MetricSummary::from_samples(&correct_vals).mean,
        direct: MetricSummary::from_samples(&direct_vals).mean,
        correct_direct: MetricSummary::from_samples(&correct_direct_vals),
        coarse_shares: coarse_sums,
    }
}
