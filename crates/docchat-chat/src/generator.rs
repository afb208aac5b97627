//! Gemini `generateContent` client.
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use docchat_core::config::{resolve_api_key, GenerationSettings};
use docchat_core::error::{Error, Result};
use docchat_core::traits::AnswerGenerator;

pub struct GeminiGenerator {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<TextPart>,
}

#[derive(Deserialize)]
struct TextPart {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    /// Text of the first candidate, parts concatenated.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter().map(|p| p.text.as_str()).collect::<String>())
            .unwrap_or_default()
    }
}

impl GeminiGenerator {
    pub fn from_settings(settings: &GenerationSettings) -> Result<Self> {
        let api_key = resolve_api_key(settings.api_key.as_deref())
            .ok_or_else(|| Error::InvalidConfig("no Gemini API key: set generation.api_key or GOOGLE_API_KEY".into()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::InvalidConfig(format!("Failed to build HTTP client: {e}")))?;
        info!("Gemini generator: model={}", settings.model);
        Ok(Self { client, base_url: settings.base_url.trim_end_matches('/').to_string(), model: settings.model.clone(), api_key })
    }
}

#[async_trait]
impl AnswerGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = json!({ "contents": [{ "role": "user", "parts": [{ "text": prompt }] }] });
        debug!("Generating with {} ({} prompt chars)", self.model, prompt.len());
        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Generation(format!("HTTP request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Generation(format!("HTTP error ({status}): {text}")));
        }
        let parsed: GenerateResponse = response.json().await.map_err(|e| Error::Generation(format!("Failed to parse response: {e}")))?;
        Ok(parsed.text().trim().to_string())
    }
}
