//! Deterministic oracle for tests and offline smoke runs.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::OracleError;
use crate::model::CoarseType;

use super::{CoarseVerdict, EntityMentions, JudgeOracle};

/// Scripted oracle. Replies queued by the `with_*` builders are consumed
/// front-to-back, one per call; an empty queue falls back to a fixed
/// neutral reply so the oracle also works for open-ended dry runs.
#[derive(Debug, Default)]
pub struct FakeOracle {
    verdicts: Mutex<Vec<Result<CoarseVerdict, OracleError>>>,
    mentions: Mutex<Vec<Result<EntityMentions, OracleError>>>,
}

impl FakeOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verdict(self, category: CoarseType, explanation: &str) -> Self {
        self.verdicts.lock().unwrap().push(Ok(CoarseVerdict {
            explanation: explanation.to_string(),
            category,
        }));
        self
    }

    pub fn with_verdict_error(self, err: OracleError) -> Self {
        self.verdicts.lock().unwrap().push(Err(err));
        self
    }

    pub fn with_mentions(self, mentioned: &[&str]) -> Self {
        self.mentions.lock().unwrap().push(Ok(EntityMentions {
            explanation: String::new(),
            mentioned_entities: mentioned.iter().map(|s| s.to_string()).collect(),
        }));
        self
    }

    pub fn with_mentions_error(self, err: OracleError) -> Self {
        self.mentions.lock().unwrap().push(Err(err));
        self
    }
}

#[async_trait]
impl JudgeOracle for FakeOracle {
    async fn classify(
        &self,
        _question: &str,
        _answer: &str,
    ) -> Result<CoarseVerdict, OracleError> {
        let mut queue = self.verdicts.lock().unwrap();
        if queue.is_empty() {
            return Ok(CoarseVerdict {
                explanation: "fake verdict".to_string(),
                category: CoarseType::AnswerAttempt,
            });
        }
        queue.remove(0)
    }

    async fn extract(
        &self,
        _entities: &[String],
        _answer: &str,
    ) -> Result<EntityMentions, OracleError> {
        let mut queue = self.mentions.lock().unwrap();
        if queue.is_empty() {
            return Ok(EntityMentions {
                explanation: "fake extraction".to_string(),
                mentioned_entities: vec![],
            });
        }
        queue.remove(0)
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_replies_come_back_in_order() {
        let oracle = FakeOracle::new()
            .with_verdict(CoarseType::Hedge, "first")
            .with_verdict(CoarseType::Refuse, "second");

        let a = oracle.classify("q", "a").await.unwrap();
        let b = oracle.classify("q", "a").await.unwrap();
        assert_eq!(a.category, CoarseType::Hedge);
        assert_eq!(b.category, CoarseType::Refuse);
    }

    #[tokio::test]
    async fn empty_queue_returns_neutral_reply() {
        let oracle = FakeOracle::new();
        let verdict = oracle.classify("q", "a").await.unwrap();
        assert_eq!(verdict.category, CoarseType::AnswerAttempt);
        let mentions = oracle.extract(&[], "a").await.unwrap();
        assert!(mentions.mentioned_entities.is_empty());
    }
}
