//! Domain records and label vocabularies.
//!
//! Everything here is serialized to and from NDJSON files, so the serde
//! names are part of the on-disk contract and must not drift.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// A candidate referent: a surface form plus a one-sentence disambiguating
/// context. Identity is per-language; cross-language alignment is by index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub entity: String,
    pub context: String,
}

/// One evaluation item: an ambiguous question, 1-2 positive referents and
/// exactly one negative (distractor) referent. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub question: String,
    pub positive: Vec<Entity>,
    pub negative: Entity,
}

impl Entry {
    /// Entity surface forms in prompt order: positives first, then the
    /// negative. This is also the order batch extraction requests use.
    pub fn entity_surfaces(&self) -> Vec<String> {
        let mut out: Vec<String> = self.positive.iter().map(|e| e.entity.clone()).collect();
        out.push(self.negative.entity.clone());
        out
    }

    /// Lower-cased positive surface forms, the canonical match set.
    pub fn canonical_positives(&self) -> Vec<String> {
        self.positive
            .iter()
            .map(|e| e.entity.to_lowercase())
            .collect()
    }

    /// Lower-cased negative surface form.
    pub fn canonical_negative(&self) -> String {
        self.negative.entity.to_lowercase()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One prompt turn exactly as sent to (or received from) the responding model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

/// A stored model response: the originating entry, the generated answer and
/// the conversation that elicited it. `judge_response` is absent until a
/// judging pass fills it in; re-judging overwrites it whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub entry: Entry,
    pub answer: String,
    #[serde(default)]
    pub conversation: Vec<ConversationTurn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judge_response: Option<JudgeResponse>,
}

/// High-level response strategy, as labelled by the classification oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoarseType {
    Refuse,
    Missing,
    AnswerAttempt,
    Hedge,
    Clarification,
}

impl CoarseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoarseType::Refuse => "refuse",
            CoarseType::Missing => "missing",
            CoarseType::AnswerAttempt => "answer_attempt",
            CoarseType::Hedge => "hedge",
            CoarseType::Clarification => "clarification",
        }
    }
}

impl std::fmt::Display for CoarseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Finer-grained outcome derived from coarse type and entity-mention counts.
/// The mixed-case serde names are historical and wire-exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FineCategory {
    #[serde(rename = "refuse")]
    Refuse,
    #[serde(rename = "missing")]
    Missing,
    #[serde(rename = "No Resolution")]
    NoResolution,
    #[serde(rename = "Negative")]
    Negative,
    #[serde(rename = "Direct")]
    Direct,
    #[serde(rename = "General")]
    General,
    #[serde(rename = "Partial")]
    Partial,
    #[serde(rename = "Mixed")]
    Mixed,
    #[serde(rename = "Meta")]
    Meta,
    /// Fallback for combinations outside the lookup tables.
    #[serde(rename = "Unknown")]
    Unknown,
}

impl FineCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FineCategory::Refuse => "refuse",
            FineCategory::Missing => "missing",
            FineCategory::NoResolution => "No Resolution",
            FineCategory::Negative => "Negative",
            FineCategory::Direct => "Direct",
            FineCategory::General => "General",
            FineCategory::Partial => "Partial",
            FineCategory::Mixed => "Mixed",
            FineCategory::Meta => "Meta",
            FineCategory::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for FineCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final verdict bucket.
///
/// The resolver tables never emit `PartiallyCorrect`; it is accepted on
/// input because hand-audited files may carry it, and the mention tallies
/// keep a separate bucket for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Correctness {
    #[serde(rename = "Correct")]
    Correct,
    #[serde(rename = "Partially Correct")]
    PartiallyCorrect,
    #[serde(rename = "Wrong")]
    Wrong,
    #[serde(rename = "Refuse")]
    Refuse,
    #[serde(rename = "Missing")]
    Missing,
    #[serde(rename = "Error")]
    Error,
}

impl Correctness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Correctness::Correct => "Correct",
            Correctness::PartiallyCorrect => "Partially Correct",
            Correctness::Wrong => "Wrong",
            Correctness::Refuse => "Refuse",
            Correctness::Missing => "Missing",
            Correctness::Error => "Error",
        }
    }
}

impl std::fmt::Display for Correctness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The verdict attached to a response. Derived, never hand-created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeResponse {
    pub coarse_type: CoarseType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub mentioned_entities: Vec<String>,
    pub pos_found: u32,
    pub neg_found: u32,
    pub fine_category: FineCategory,
    pub correctness: Correctness,
}

/// Which lookup table and permutation space applies. Fixed per judging run,
/// never mixed within one aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetVariant {
    /// 2 candidates: 1 positive + 1 negative.
    ClearRef,
    /// 3 candidates: 2 positive + 1 negative.
    SharedRef,
}

impl DatasetVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetVariant::ClearRef => "clear_ref",
            DatasetVariant::SharedRef => "shared_ref",
        }
    }

    pub fn entity_count(&self) -> usize {
        match self {
            DatasetVariant::ClearRef => 2,
            DatasetVariant::SharedRef => 3,
        }
    }

    /// The in-dataset entity order, used when no ablation is in play.
    pub fn identity_order(&self) -> Permutation {
        match self {
            DatasetVariant::ClearRef => Permutation::identity(2),
            DatasetVariant::SharedRef => Permutation::identity(3),
        }
    }
}

impl std::str::FromStr for DatasetVariant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clear_ref" => Ok(DatasetVariant::ClearRef),
            "shared_ref" => Ok(DatasetVariant::SharedRef),
            other => Err(ConfigError(format!(
                "unknown dataset variant '{}' (expected clear_ref or shared_ref)",
                other
            ))),
        }
    }
}

impl std::fmt::Display for DatasetVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entity insertion order, encoded as a digit string (`"201"` places
/// original index 2 first). The encoding appears in filenames and in the
/// positional ablation, so it stays a string at the edges and is validated
/// on the way in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permutation(String);

impl Permutation {
    pub fn new(digits: &str) -> Result<Self, ConfigError> {
        if digits.is_empty() {
            return Err(ConfigError("permutation string is empty".into()));
        }
        let mut seen = [false; 10];
        for c in digits.chars() {
            let Some(d) = c.to_digit(10) else {
                return Err(ConfigError(format!(
                    "permutation '{}' contains non-digit '{}'",
                    digits, c
                )));
            };
            if seen[d as usize] {
                return Err(ConfigError(format!(
                    "permutation '{}' repeats digit '{}'",
                    digits, c
                )));
            }
            seen[d as usize] = true;
        }
        for d in 0..digits.len() {
            if !seen[d] {
                return Err(ConfigError(format!(
                    "permutation '{}' is not a permutation of 0..{}",
                    digits,
                    digits.len()
                )));
            }
        }
        Ok(Permutation(digits.to_string()))
    }

    /// `0..n` in order. Orders beyond ten entities are not representable.
    pub fn identity(n: usize) -> Self {
        debug_assert!(n <= 10);
        Permutation((0..n).filter_map(|d| char::from_digit(d as u32, 10)).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Prompt position of the entity with original index `idx`, i.e. the
    /// character position of that digit in the encoding.
    pub fn position_of(&self, idx: usize) -> Option<usize> {
        let c = char::from_digit(idx as u32, 10)?;
        self.0.find(c)
    }

    /// Every ordering of `n` entities, lexicographic.
    pub fn all(n: usize) -> Vec<Permutation> {
        fn build(prefix: &mut String, remaining: &[char], out: &mut Vec<String>) {
            if remaining.is_empty() {
                out.push(prefix.clone());
                return;
            }
            for (i, c) in remaining.iter().enumerate() {
                prefix.push(*c);
                let mut rest = remaining.to_vec();
                rest.remove(i);
                build(prefix, &rest, out);
                prefix.pop();
            }
        }
        let digits: Vec<char> = (0..n)
            .filter_map(|d| char::from_digit(d as u32, 10))
            .collect();
        let mut raw = Vec::new();
        build(&mut String::new(), &digits, &mut raw);
        raw.into_iter().map(Permutation).collect()
    }
}

impl std::fmt::Display for Permutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Permutation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permutation::new(s)
    }
}
