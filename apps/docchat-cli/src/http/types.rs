use serde::{Deserialize, Serialize};

use docchat_core::types::Chunk;
use docchat_hybrid::FusedResult;

pub const SNIPPET_CHARS: usize = 240;

/// First 240 characters, with "..." appended when the text was cut.
pub fn snippet(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(SNIPPET_CHARS).collect();
    if chars.next().is_some() { format!("{head}...") } else { head }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub namespace: String,
    pub q: String,
    pub k: Option<usize>,
    pub alpha: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchHitJson {
    pub score: f64,
    pub filename: String,
    pub page: Option<u32>,
    pub namespace: String,
    pub snippet: String,
}

impl From<&FusedResult> for SearchHitJson {
    fn from(r: &FusedResult) -> Self {
        Self {
            score: (f64::from(r.score) * 10_000.0).round() / 10_000.0,
            filename: r.chunk.filename.clone(),
            page: r.chunk.page,
            namespace: r.chunk.namespace.clone(),
            snippet: snippet(&r.chunk.text),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub namespace: String,
    pub alpha: f32,
    pub results: Vec<SearchHitJson>,
}

#[derive(Debug, Deserialize)]
pub struct NamespaceParams {
    pub namespace: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SavedFile {
    pub filename: String,
    pub size_kb: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub namespace: String,
    pub files_saved: Vec<SavedFile>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct PreviewParams {
    pub namespace: String,
    pub filename: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub id: String,
    pub namespace: String,
    pub filename: String,
    pub page: Option<u32>,
    pub section: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PreviewChunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl From<&Chunk> for PreviewChunk {
    fn from(c: &Chunk) -> Self {
        Self {
            text: snippet(&c.text),
            metadata: ChunkMetadata {
                id: c.id.clone(),
                namespace: c.namespace.clone(),
                filename: c.filename.clone(),
                page: c.page,
                section: c.section.clone(),
                source: c.source.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub namespace: String,
    pub filename: String,
    pub total_chunks: usize,
    pub preview: Vec<PreviewChunk>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self { Self { code: code.into(), message: message.into() } }

    pub fn internal_error(message: impl Into<String>) -> Self { Self::new("INTERNAL_ERROR", message) }

    pub fn bad_request(message: impl Into<String>) -> Self { Self::new("BAD_REQUEST", message) }
}
