//! The external judgment oracle: a capability interface with one live
//! implementation, a deterministic fake for tests, a retry policy, and a
//! batch path for large sweeps.

pub mod batch;
pub mod batch_client;
pub mod fake;
pub mod openai;
pub mod retry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::OracleError;
use crate::model::{CoarseType, Role};

/// One chat turn in an oracle request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Reply of the coarse classification oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoarseVerdict {
    pub explanation: String,
    pub category: CoarseType,
}

/// Reply of the entity extraction oracle. Spelling is expected to echo the
/// request's entity list; the grounding step tolerates deviations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMentions {
    pub explanation: String,
    pub mentioned_entities: Vec<String>,
}

/// Capability interface over the two oracle calls. Both are stateless and
/// idempotent for the same inputs; transient failures are the caller's to
/// retry (see [`retry::RetryPolicy`]).
#[async_trait]
pub trait JudgeOracle: Send + Sync {
    async fn classify(&self, question: &str, answer: &str) -> Result<CoarseVerdict, OracleError>;

    async fn extract(
        &self,
        entities: &[String],
        answer: &str,
    ) -> Result<EntityMentions, OracleError>;

    fn name(&self) -> &'static str;
}

/// Schema names embedded in batch artifacts on disk; changing them would
/// orphan previously submitted jobs.
pub(crate) const COARSE_SCHEMA_NAME: &str = "ResponseCategory";
pub(crate) const MENTIONS_SCHEMA_NAME: &str = "MentionedEntities";

/// Structured-output schema for [`CoarseVerdict`].
pub(crate) fn coarse_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "explanation": {
                "type": "string",
            },
            "category": {
                "type": "string",
                "enum": [
                    "refuse",
                    "missing",
                    "answer_attempt",
                    "hedge",
                    "clarification",
                ]
            },
        },
        "required": ["explanation", "category"],
        "additionalProperties": false
    })
}

/// Structured-output schema for [`EntityMentions`].
pub(crate) fn mentions_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "explanation": {
                "type": "string",
            },
            "mentioned_entities": {
                "type": "array",
                "items": {
                    "type": "string"
                },
                "description": "List of explicitly mentioned entities from the given list."
            }
        },
        "required": ["explanation", "mentioned_entities"],
        "additionalProperties": false
    })
}

/// Request body for the structured `/v1/responses` endpoint. The same shape
/// is used for live calls and for each batch task line.
pub(crate) fn request_body(
    model: &str,
    input: &[ChatMessage],
    schema_name: &str,
    schema: Value,
) -> Result<Value, OracleError> {
    let input = serde_json::to_value(input).map_err(|e| OracleError::MalformedPayload {
        detail: format!("failed to encode request input: {}", e),
    })?;
    Ok(json!({
        "model": model,
        "temperature": 0,
        "input": input,
        "text": {
            "format": {
                "type": "json_schema",
                "name": schema_name,
                "schema": schema,
                "strict": true
            }
        }
    }))
}

/// Pull the reply text out of a `/v1/responses` payload: the last content
/// block of the last output item.
pub(crate) fn extract_output_text(payload: &Value) -> Option<&str> {
    payload
        .get("output")?
        .as_array()?
        .last()?
        .get("content")?
        .as_array()?
        .last()?
        .get("text")?
        .as_str()
}

/// Decode the JSON the oracle was instructed to emit.
pub(crate) fn parse_reply<T: serde::de::DeserializeOwned>(payload: &Value) -> Result<T, OracleError> {
    let text = extract_output_text(payload).ok_or_else(|| OracleError::MalformedPayload {
        detail: "response payload has no output text".to_string(),
    })?;
    serde_json::from_str(text).map_err(|e| OracleError::MalformedPayload {
        detail: format!("reply text is not the promised JSON: {}", e),
    })
}
