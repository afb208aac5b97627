//! Gemini `batchEmbedContents` client.
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use docchat_core::config::{resolve_api_key, EmbeddingSettings};
use docchat_core::error::{Error, Result};
use docchat_core::traits::Embedder;

use crate::retry::RetryPolicy;

const TASK_TYPE: &str = "RETRIEVAL_DOCUMENT";

pub struct GeminiEmbedder {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    dim: usize,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct BatchResponse {
    #[serde(default)]
    embeddings: Vec<Values>,
}

#[derive(Deserialize)]
struct Values {
    values: Vec<f32>,
}

impl GeminiEmbedder {
    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self> {
        let api_key = resolve_api_key(settings.api_key.as_deref())
            .ok_or_else(|| Error::InvalidConfig("no Gemini API key: set embedding.api_key or GOOGLE_API_KEY".into()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::InvalidConfig(format!("Failed to build HTTP client: {e}")))?;
        info!("Gemini embedder: model={}, dim={}", settings.model, settings.dim);
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key,
            dim: settings.dim,
            retry: RetryPolicy::default().with_max_attempts(settings.max_attempts),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self { self.retry = retry; self }

    fn endpoint(&self) -> String { format!("{}/models/{}:batchEmbedContents", self.base_url, self.model) }

    /// One HTTP round trip. Errors carry whether a retry may help.
    async fn request(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, (Error, bool)> {
        let model = format!("models/{}", self.model);
        let body = BatchRequest {
            requests: texts
                .iter()
                .map(|t| EmbedRequest { model: &model, content: Content { parts: [Part { text: t }] }, task_type: TASK_TYPE })
                .collect(),
        };
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| (Error::Embedding(format!("HTTP request failed: {e}")), true))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let retryable = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            return Err((Error::Embedding(format!("HTTP error ({status}): {text}")), retryable));
        }
        let parsed: BatchResponse = response
            .json()
            .await
            .map_err(|e| (Error::Embedding(format!("Failed to parse response: {e}")), false))?;
        Ok(parsed.embeddings.into_iter().map(|e| e.values).collect())
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    fn dim(&self) -> usize { self.dim }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() { return Ok(vec![]); }
        debug!("Embedding {} texts with {}", texts.len(), self.model);
        let vectors = self.retry.run("embed batch", || self.request(texts)).await?;
        if vectors.len() != texts.len() {
            return Err(Error::Embedding(format!("expected {} embeddings, got {}", texts.len(), vectors.len())));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dim) {
            warn!("Embedding dimension mismatch: configured {}, received {}", self.dim, bad.len());
            return Err(Error::Embedding(format!("expected dimension {}, got {}", self.dim, bad.len())));
        }
        Ok(vectors)
    }
}
