//! Fine-category lookup tables.
//!
//! One table per dataset variant, keyed by coarse type and the deduplicated
//! positive/negative mention counts. Written as a single total `match` so
//! that coverage gaps are visible in the source instead of hiding behind a
//! map miss; anything outside the tables falls through to
//! `(Unknown, Error)`, which aggregation keeps as its own bucket.

use crate::model::{CoarseType, Correctness, DatasetVariant, FineCategory};

/// Maps a coarse strategy plus entity-mention counts to the fine category
/// and final verdict. Pure; same input always gives the same output.
pub fn resolve(
    coarse: CoarseType,
    pos_found: u32,
    neg_found: u32,
    variant: DatasetVariant,
) -> (FineCategory, Correctness) {
    use Correctness as C;
    use FineCategory as F;

    // Refusals and empty responses keep their label no matter what the
    // extraction oracle saw.
    match coarse {
        CoarseType::Refuse => return (F::Refuse, C::Refuse),
        CoarseType::Missing => return (F::Missing, C::Missing),
        _ => {}
    }

    match variant {
        DatasetVariant::ClearRef => match (coarse, pos_found, neg_found) {
            // Naming nothing is the expected model behavior for this split.
            (CoarseType::AnswerAttempt, 0, 0) => (F::NoResolution, C::Correct),
            (CoarseType::AnswerAttempt, 0, 1) => (F::Negative, C::Wrong),
            (CoarseType::AnswerAttempt, 1, 0) => (F::Direct, C::Correct),
            (CoarseType::AnswerAttempt, 1, 1) => (F::General, C::Correct),

            (CoarseType::Hedge, 0, 0) => (F::NoResolution, C::Wrong),
            (CoarseType::Hedge, 0, 1) => (F::Negative, C::Correct),
            (CoarseType::Hedge, 1, 0) => (F::Direct, C::Correct),
            (CoarseType::Hedge, 1, 1) => (F::General, C::Correct),

            (CoarseType::Clarification, 0, 0) => (F::Meta, C::Correct),
            (CoarseType::Clarification, 0, 1) => (F::Negative, C::Correct),
            (CoarseType::Clarification, 1, 0) => (F::Direct, C::Correct),
            (CoarseType::Clarification, 1, 1) => (F::General, C::Correct),

            _ => (F::Unknown, C::Error),
        },
        DatasetVariant::SharedRef => match (coarse, pos_found, neg_found) {
            (CoarseType::AnswerAttempt, 0, 0) => (F::NoResolution, C::Wrong),
            (CoarseType::AnswerAttempt, 0, 1) => (F::Negative, C::Wrong),
            // Committing to only one of the two referents is wrong here.
            (CoarseType::AnswerAttempt, 1, 0) => (F::Partial, C::Wrong),
            (CoarseType::AnswerAttempt, 1, 1) => (F::Mixed, C::Wrong),
            (CoarseType::AnswerAttempt, 2, 0) => (F::Direct, C::Correct),
            (CoarseType::AnswerAttempt, 2, 1) => (F::General, C::Correct),

            (CoarseType::Hedge, 0, 0) => (F::NoResolution, C::Wrong),
            (CoarseType::Hedge, 0, 1) => (F::Negative, C::Correct),
            (CoarseType::Hedge, 1, 0) => (F::Partial, C::Correct),
            (CoarseType::Hedge, 1, 1) => (F::Mixed, C::Correct),
            (CoarseType::Hedge, 2, 0) => (F::Direct, C::Correct),
            (CoarseType::Hedge, 2, 1) => (F::General, C::Correct),

            (CoarseType::Clarification, 0, 0) => (F::Meta, C::Correct),
            (CoarseType::Clarification, 0, 1) => (F::Negative, C::Correct),
            (CoarseType::Clarification, 1, 0) => (F::Partial, C::Correct),
            (CoarseType::Clarification, 1, 1) => (F::Mixed, C::Correct),
            (CoarseType::Clarification, 2, 0) => (F::Direct, C::Correct),
            (CoarseType::Clarification, 2, 1) => (F::General, C::Correct),

            _ => (F::Unknown, C::Error),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CoarseType as T;
    use crate::model::Correctness as C;
    use crate::model::DatasetVariant::{ClearRef, SharedRef};
    use crate::model::FineCategory as F;

    #[test]
    fn clear_ref_table_is_exact() {
        let cases = [
            (T::AnswerAttempt, 0, 0, F::NoResolution, C::Correct),
            (T::AnswerAttempt, 0, 1, F::Negative, C::Wrong),
            (T::AnswerAttempt, 1, 0, F::Direct, C::Correct),
            (T::AnswerAttempt, 1, 1, F::General, C::Correct),
            (T::Hedge, 0, 0, F::NoResolution, C::Wrong),
            (T::Hedge, 0, 1, F::Negative, C::Correct),
            (T::Hedge, 1, 0, F::Direct, C::Correct),
            (T::Hedge, 1, 1, F::General, C::Correct),
            (T::Clarification, 0, 0, F::Meta, C::Correct),
            (T::Clarification, 0, 1, F::Negative, C::Correct),
            (T::Clarification, 1, 0, F::Direct, C::Correct),
            (T::Clarification, 1, 1, F::General, C::Correct),
        ];
        for (coarse, pos, neg, fine, correctness) in cases {
            assert_eq!(
                resolve(coarse, pos, neg, ClearRef),
                (fine, correctness),
                "({coarse}, {pos}, {neg})"
            );
        }
    }

    #[test]
    fn shared_ref_table_is_exact() {
        let cases = [
            (T::AnswerAttempt, 0, 0, F::NoResolution, C::Wrong),
            (T::AnswerAttempt, 0, 1, F::Negative, C::Wrong),
            (T::AnswerAttempt, 1, 0, F::Partial, C::Wrong),
            (T::AnswerAttempt, 1, 1, F::Mixed, C::Wrong),
            (T::AnswerAttempt, 2, 0, F::Direct, C::Correct),
            (T::AnswerAttempt, 2, 1, F::General, C::Correct),
            (T::Hedge, 0, 0, F::NoResolution, C::Wrong),
            (T::Hedge, 0, 1, F::Negative, C::Correct),
            (T::Hedge, 1, 0, F::Partial, C::Correct),
            (T::Hedge, 1, 1, F::Mixed, C::Correct),
            (T::Hedge, 2, 0, F::Direct, C::Correct),
            (T::Hedge, 2, 1, F::General, C::Correct),
            (T::Clarification, 0, 0, F::Meta, C::Correct),
            (T::Clarification, 0, 1, F::Negative, C::Correct),
            (T::Clarification, 1, 0, F::Partial, C::Correct),
            (T::Clarification, 1, 1, F::Mixed, C::Correct),
            (T::Clarification, 2, 0, F::Direct, C::Correct),
            (T::Clarification, 2, 1, F::General, C::Correct),
        ];
        for (coarse, pos, neg, fine, correctness) in cases {
            assert_eq!(
                resolve(coarse, pos, neg, SharedRef),
                (fine, correctness),
                "({coarse}, {pos}, {neg})"
            );
        }
    }

    #[test]
    fn hedge_with_both_entities_is_general_correct() {
        assert_eq!(resolve(T::Hedge, 1, 1, ClearRef), (F::General, C::Correct));
    }

    #[test]
    fn committed_negative_answer_is_wrong() {
        assert_eq!(
            resolve(T::AnswerAttempt, 0, 1, SharedRef),
            (F::Negative, C::Wrong)
        );
    }

    #[test]
    fn out_of_table_counts_resolve_to_unknown_error() {
        assert_eq!(resolve(T::AnswerAttempt, 2, 0, ClearRef), (F::Unknown, C::Error));
        assert_eq!(resolve(T::Hedge, 3, 0, SharedRef), (F::Unknown, C::Error));
        assert_eq!(resolve(T::Clarification, 0, 2, SharedRef), (F::Unknown, C::Error));
    }

    #[test]
    fn resolve_is_deterministic() {
        for _ in 0..3 {
            assert_eq!(
                resolve(T::Hedge, 1, 0, SharedRef),
                resolve(T::Hedge, 1, 0, SharedRef)
            );
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn refuse_keeps_its_verdict_for_any_counts(pos in 0u32..100, neg in 0u32..100) {
                prop_assert_eq!(resolve(T::Refuse, pos, neg, ClearRef), (F::Refuse, C::Refuse));
                prop_assert_eq!(resolve(T::Refuse, pos, neg, SharedRef), (F::Refuse, C::Refuse));
            }

            #[test]
            fn missing_keeps_its_verdict_for_any_counts(pos in 0u32..100, neg in 0u32..100) {
                prop_assert_eq!(resolve(T::Missing, pos, neg, ClearRef), (F::Missing, C::Missing));
                prop_assert_eq!(resolve(T::Missing, pos, neg, SharedRef), (F::Missing, C::Missing));
            }
        }
    }
}
