//! Entity grounding: maps raw oracle mentions onto the entry's canonical
//! entity set.
//!
//! The extraction oracle promises exact input spelling back, but replies
//! drift in practice (casing, definite articles, compound spellings), so
//! canonicalization is tried in a strict order before a mention is given
//! up on. Ungroundable mentions are logged and skipped, never counted.

use std::collections::BTreeSet;

use tracing::warn;

use crate::model::Entry;

/// Arabic definite article, the one language-specific prefix the corpus
/// needs stripped.
const ARABIC_DEFINITE_ARTICLE: &str = "ال";

/// Known orthographic merges: compound spellings the oracle produces for
/// multi-word surface forms.
const ALIASES: &[(&str, &str)] = &[("الهليكوبتر", "طائرة هليكوبتر")];

/// Canonicalized mention counts for one response.
///
/// `pos_found` / `neg_found` count distinct canonical entities, so a
/// referent repeated five times still counts once. `mentioned_entities`
/// keeps every grounded mention in reply order, duplicates included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundedMentions {
    pub pos_found: u32,
    pub neg_found: u32,
    pub mentioned_entities: Vec<String>,
}

/// Lower-case a mention and resolve it against the entry's canonical set:
/// exact match first, then with the Arabic article stripped, then through
/// the alias table. `None` when nothing grounds it.
fn canonicalize(mention: &str, valid: &BTreeSet<String>) -> Option<String> {
    let ent = mention.to_lowercase();
    if valid.contains(&ent) {
        return Some(ent);
    }
    if let Some(stripped) = ent.strip_prefix(ARABIC_DEFINITE_ARTICLE) {
        if valid.contains(stripped) {
            return Some(stripped.to_string());
        }
    }
    if let Some((_, target)) = ALIASES.iter().find(|(from, _)| *from == ent) {
        if valid.contains(*target) {
            return Some((*target).to_string());
        }
    }
    None
}

pub fn ground_mentions(mentions: &[String], entry: &Entry) -> GroundedMentions {
    let positives = entry.canonical_positives();
    let negative = entry.canonical_negative();
    let valid: BTreeSet<String> = positives.iter().cloned().chain([negative.clone()]).collect();

    let mut pos_found = 0u32;
    let mut neg_found = 0u32;
    let mut counted: BTreeSet<String> = BTreeSet::new();
    let mut mentioned_entities = Vec::new();

    for mention in mentions {
        let Some(canonical) = canonicalize(mention, &valid) else {
            warn!(
                mention = %mention,
                question = %entry.question,
                "mention not groundable, skipping"
            );
            continue;
        };

        if counted.insert(canonical.clone()) {
            if positives.contains(&canonical) {
                pos_found += 1;
            } else if canonical == negative {
                neg_found += 1;
            }
        }
        mentioned_entities.push(canonical);
    }

    GroundedMentions {
        pos_found,
        neg_found,
        mentioned_entities,
    }
}
