//! HTTP client for the batch job lifecycle: upload the task file, create
//! the job, poll it, download the result file.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use serde_json::json;

const API_BASE: &str = "https://api.openai.com/v1";
const COMPLETION_WINDOW: &str = "24h";

#[derive(Debug, Clone, Deserialize)]
pub struct UploadedFile {
    pub id: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub bytes: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RequestCounts {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub completed: u64,
    #[serde(default)]
    pub failed: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchJob {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub output_file_id: Option<String>,
    #[serde(default)]
    pub error_file_id: Option<String>,
    #[serde(default)]
    pub request_counts: Option<RequestCounts>,
}

impl BatchJob {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status.as_str(),
            "completed" | "failed" | "expired" | "cancelled"
        )
    }

    pub fn is_completed(&self) -> bool {
        self.status == "completed"
    }
}

pub struct BatchClient {
    api_key: String,
    client: reqwest::Client,
}

impl BatchClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Upload an NDJSON task file with purpose `batch`.
    pub async fn upload_task_file(&self, path: &Path) -> anyhow::Result<UploadedFile> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read task file {}", path.display()))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "tasks.jsonl".to_string());

        let form = reqwest::multipart::Form::new()
            .text("purpose", "batch")
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes).file_name(filename),
            );

        let resp = self
            .client
            .post(format!("{}/files", API_BASE))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_else(|_| String::new());
            anyhow::bail!("file upload failed (status {}): {}", status, body);
        }

        Ok(resp.json().await?)
    }

    /// Create a batch job over an uploaded task file.
    pub async fn create_job(&self, input_file_id: &str, endpoint: &str) -> anyhow::Result<BatchJob> {
        let body = json!({
            "input_file_id": input_file_id,
            "endpoint": endpoint,
            "completion_window": COMPLETION_WINDOW,
        });

        let resp = self
            .client
            .post(format!("{}/batches", API_BASE))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_else(|_| String::new());
            anyhow::bail!("batch creation failed (status {}): {}", status, body);
        }

        Ok(resp.json().await?)
    }

    /// Upload a task file and start a job over it.
    pub async fn submit(&self, path: &Path, endpoint: &str) -> anyhow::Result<BatchJob> {
        let uploaded = self.upload_task_file(path).await?;
        self.create_job(&uploaded.id, endpoint).await
    }

    pub async fn get_job(&self, job_id: &str) -> anyhow::Result<BatchJob> {
        let resp = self
            .client
            .get(format!("{}/batches/{}", API_BASE, job_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_else(|_| String::new());
            anyhow::bail!("batch lookup failed (status {}): {}", status, body);
        }

        Ok(resp.json().await?)
    }

    /// Download a result file's raw NDJSON content.
    pub async fn download_file(&self, file_id: &str) -> anyhow::Result<String> {
        let resp = self
            .client
            .get(format!("{}/files/{}/content", API_BASE, file_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_else(|_| String::new());
            anyhow::bail!("file download failed (status {}): {}", status, body);
        }

        Ok(resp.text().await?)
    }
}
