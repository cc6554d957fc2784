//! Positional-bias ablation: the same items judged under every entity
//! insertion order, reduced two ways at once.
//!
//! Accumulating mention counts across permutations entity-keyed answers
//! "does the model favor entity X", position-keyed answers "does the model
//! favor the first-mentioned slot". The two views use the same underlying
//! counts and are converted to percentages independently.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{DatasetVariant, Permutation, Response};
use crate::stats::{MentionBuckets, MentionTally, ResponseStats};

/// One judged output file fed into the ablation: the mode and entity order
/// its responses were collected under.
#[derive(Debug, Clone)]
pub struct AblationSlice {
    pub mode: String,
    pub order: Permutation,
    pub responses: Vec<Response>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AblationReport {
    /// mode -> permutation digits -> stats under that permutation.
    pub per_permutation: BTreeMap<String, BTreeMap<String, ResponseStats>>,
    /// mode -> mention tallies summed across permutations, entity-keyed.
    pub entity: BTreeMap<String, MentionTally>,
    /// mode -> mention tallies summed across permutations, position-keyed.
    pub position: BTreeMap<String, MentionTally>,
    /// mode -> stats over all permutations pooled, computed under the
    /// variant's identity order.
    pub pooled: BTreeMap<String, ResponseStats>,
}

pub fn ablate(slices: &[AblationSlice], variant: DatasetVariant) -> AblationReport {
    let mut per_permutation: BTreeMap<String, BTreeMap<String, ResponseStats>> = BTreeMap::new();
    let mut entity_acc: BTreeMap<String, MentionBuckets<u64>> = BTreeMap::new();
    let mut position_acc: BTreeMap<String, MentionBuckets<u64>> = BTreeMap::new();

    for slice in slices {
        let stats = ResponseStats::collect(&slice.responses, &slice.order);

        entity_acc
            .entry(slice.mode.clone())
            .or_default()
            .merge(&stats.entity_counters.count);
        position_acc
            .entry(slice.mode.clone())
            .or_default()
            .merge(&stats.pos_counters.count);

        per_permutation
            .entry(slice.mode.clone())
            .or_default()
            .insert(slice.order.as_str().to_string(), stats);
    }

    let identity = variant.identity_order();
    let modes: Vec<String> = per_permutation.keys().cloned().collect();
    let mut pooled = BTreeMap::new();
    for mode in modes {
        let all = slices
            .iter()
            .filter(|s| s.mode == mode)
            .flat_map(|s| &s.responses);
        pooled.insert(mode, ResponseStats::collect(all, &identity));
    }

    AblationReport {
        per_permutation,
        entity: entity_acc
            .into_iter()
            .map(|(mode, counts)| (mode, MentionTally::from_counts(counts)))
            .collect(),
        position: position_acc
            .into_iter()
            .map(|(mode, counts)| (mode, MentionTally::from_counts(counts)))
            .collect(),
        pooled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CoarseType, Correctness, Entity, Entry, FineCategory, JudgeResponse};

    fn judged(mentioned: &[&str], correctness: Correctness) -> Response {
        Response {
            entry: Entry {
                question: "Why can it fly?".into(),
                positive: vec![Entity {
                    entity: "bee".into(),
                    context: String::new(),
                }],
                negative: Entity {
                    entity: "cheetah".into(),
                    context: String::new(),
                },
            },
            answer: "an answer".into(),
            conversation: Vec::new(),
            judge_response: Some(JudgeResponse {
                coarse_type: CoarseType::AnswerAttempt,
                explanation: None,
                mentioned_entities: mentioned.iter().map(|s| (*s).to_string()).collect(),
                pos_found: 0,
                neg_found: 0,
                fine_category: FineCategory::Direct,
                correctness,
            }),
        }
    }

    fn slices() -> Vec<AblationSlice> {
        vec![
            AblationSlice {
                mode: "normal".into(),
                order: Permutation::new("01").unwrap(),
                responses: vec![judged(&["bee"], Correctness::Correct)],
            },
            AblationSlice {
                mode: "normal".into(),
                order: Permutation::new("10").unwrap(),
                responses: vec![judged(&["bee"], Correctness::Correct)],
            },
        ]
    }

    #[test]
    fn entity_view_pools_across_orders_position_view_splits() {
        let report = ablate(&slices(), DatasetVariant::ClearRef);
        let entity = &report.entity["normal"].count;
        let position = &report.position["normal"].count;

        // Entity 0 mentioned in both runs regardless of where it sat.
        assert_eq!(entity.total["entity_0"], 2);
        assert_eq!(entity.total["entity_1"], 0);
        // Under "01" it sat at position 0, under "10" at position 1.
        assert_eq!(position.total["pos_0"], 1);
        assert_eq!(position.total["pos_1"], 1);
    }

    #[test]
    fn per_permutation_stats_are_kept_separately() {
        let report = ablate(&slices(), DatasetVariant::ClearRef);
        let per_mode = &report.per_permutation["normal"];
        assert_eq!(per_mode.len(), 2);
        assert_eq!(per_mode["01"].judged, 1);
        assert_eq!(per_mode["10"].pos_counters.count.total["pos_1"], 1);
    }

    #[test]
    fn pooled_stats_cover_every_permutation_under_identity() {
        let report = ablate(&slices(), DatasetVariant::ClearRef);
        let pooled = &report.pooled["normal"];
        assert_eq!(pooled.judged, 2);
        // Identity order: entity 0 always maps to position 0.
        assert_eq!(pooled.pos_counters.count.total["pos_0"], 2);
    }

    #[test]
    fn percentages_convert_each_view_independently() {
        let report = ablate(&slices(), DatasetVariant::ClearRef);
        assert_eq!(report.entity["normal"].percentage.total["entity_0"], 100.0);
        assert_eq!(report.position["normal"].percentage.total["pos_0"], 50.0);
    }

    #[test]
    fn modes_stay_separate() {
        let mut input = slices();
        input.push(AblationSlice {
            mode: "simple".into(),
            order: Permutation::new("01").unwrap(),
            responses: vec![judged(&[], Correctness::Wrong)],
        });

        let report = ablate(&input, DatasetVariant::ClearRef);
        assert_eq!(report.pooled["normal"].judged, 2);
        assert_eq!(report.pooled["simple"].judged, 1);
        assert_eq!(report.entity["simple"].count.total["entity_0"], 0);
    }
}
