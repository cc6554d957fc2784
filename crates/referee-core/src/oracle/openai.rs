//! Live oracle over the OpenAI `/v1/responses` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::OracleError;

use super::{
    coarse_schema, mentions_schema, parse_reply, request_body, ChatMessage, CoarseVerdict,
    EntityMentions, JudgeOracle, COARSE_SCHEMA_NAME, MENTIONS_SCHEMA_NAME,
};
use crate::judge::prompt;

pub const DEFAULT_JUDGE_MODEL: &str = "gpt-4.1-mini-2025-04-14";

const RESPONSES_URL: &str = "https://api.openai.com/v1/responses";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

pub struct OpenAiOracle {
    model: String,
    api_key: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl OpenAiOracle {
    pub fn new(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn call<T: DeserializeOwned>(
        &self,
        input: Vec<ChatMessage>,
        schema_name: &str,
        schema: Value,
    ) -> Result<T, OracleError> {
        let body = request_body(&self.model, &input, schema_name, schema)?;

        let request = async {
            let resp = self
                .client
                .post(RESPONSES_URL)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| OracleError::Network {
                    detail: e.to_string(),
                })?;

            let status = resp.status();
            if !status.is_success() {
                let detail = resp.text().await.unwrap_or_else(|_| String::new());
                return Err(OracleError::from_status(status.as_u16(), detail));
            }

            let payload: Value = resp.json().await.map_err(|e| OracleError::MalformedPayload {
                detail: e.to_string(),
            })?;
            parse_reply(&payload)
        };

        match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(OracleError::Timeout {
                seconds: self.timeout.as_secs(),
            }),
        }
    }
}

#[async_trait]
impl JudgeOracle for OpenAiOracle {
    async fn classify(&self, question: &str, answer: &str) -> Result<CoarseVerdict, OracleError> {
        let input = prompt::coarse_type_instructions(question, answer);
        self.call(input, COARSE_SCHEMA_NAME, coarse_schema()).await
    }

    async fn extract(
        &self,
        entities: &[String],
        answer: &str,
    ) -> Result<EntityMentions, OracleError> {
        let input = prompt::mentioned_entities_instructions(entities, answer);
        self.call(input, MENTIONS_SCHEMA_NAME, mentions_schema())
            .await
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_pins_defaults() {
        let oracle = OpenAiOracle::new(DEFAULT_JUDGE_MODEL, "test-key");
        assert_eq!(oracle.model(), "gpt-4.1-mini-2025-04-14");
        assert_eq!(oracle.timeout, DEFAULT_TIMEOUT);
        assert_eq!(oracle.name(), "openai");
    }

    #[test]
    fn timeout_is_tunable() {
        let oracle =
            OpenAiOracle::new(DEFAULT_JUDGE_MODEL, "k").with_timeout(Duration::from_secs(5));
        assert_eq!(oracle.timeout, Duration::from_secs(5));
    }
}
