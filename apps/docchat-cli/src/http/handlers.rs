use axum::extract::{Multipart, Query, State};
use axum::Json;
use chrono::Local;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use docchat_chat::{AskRequest, AskResponse, ChatService};
use docchat_core::error::Error;
use docchat_core::ingest::{is_supported, DataProcessor};
use docchat_hybrid::{namespace_dir, HybridRetriever, IndexSummary, NamespaceIndexer};

use super::error::ApiError;
use super::types::*;

pub const DEFAULT_SEARCH_K: usize = 8;
pub const MAX_SEARCH_K: usize = 20;
pub const DEFAULT_SEARCH_ALPHA: f32 = 0.6;
pub const DEFAULT_PREVIEW_LIMIT: usize = 3;
pub const MAX_PREVIEW_LIMIT: usize = 10;
const DEFAULT_NAMESPACE: &str = "default";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub retriever: Arc<HybridRetriever>,
    pub chat: Arc<ChatService>,
    pub indexer: Arc<NamespaceIndexer>,
    pub processor: DataProcessor,
}

impl AppState {
    pub fn new(retriever: Arc<HybridRetriever>, chat: Arc<ChatService>, indexer: Arc<NamespaceIndexer>, processor: DataProcessor) -> Self {
        Self { retriever, chat, indexer, processor }
    }
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok".to_string(), message: "API is running".to_string() })
}

pub async fn search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResponse>, ApiError> {
    let namespace = params.namespace.trim();
    if namespace.is_empty() { return Err(ApiError::bad_request("namespace required")); }
    if params.q.chars().count() < 2 { return Err(ApiError::bad_request("q must be at least 2 characters")); }
    let k = params.k.unwrap_or(DEFAULT_SEARCH_K);
    if !(1..=MAX_SEARCH_K).contains(&k) { return Err(ApiError::bad_request(format!("k must be between 1 and {MAX_SEARCH_K}"))); }
    let alpha = params.alpha.unwrap_or(DEFAULT_SEARCH_ALPHA);
    if !(0.0..=1.0).contains(&alpha) { return Err(ApiError::bad_request("alpha must be between 0 and 1")); }

    debug!("HTTP search request: ns={}, q={}, k={}, alpha={}", namespace, params.q, k, alpha);
    let fused = state.retriever.search(&params.q, namespace, k, alpha).await?;
    Ok(Json(SearchResponse {
        query: params.q.clone(),
        namespace: namespace.to_string(),
        alpha,
        results: fused.iter().map(SearchHitJson::from).collect(),
    }))
}

pub async fn ask(State(state): State<AppState>, Json(request): Json<AskRequest>) -> Result<Json<AskResponse>, ApiError> {
    Ok(Json(state.chat.ask(&request).await?))
}

pub async fn index_namespace(State(state): State<AppState>, Query(params): Query<NamespaceParams>) -> Result<Json<IndexSummary>, ApiError> {
    if params.namespace.trim().is_empty() { return Err(ApiError::bad_request("Namespace required")); }
    Ok(Json(state.indexer.index_namespace(&params.namespace).await?))
}

/// Saves `files` parts with a supported extension under
/// `<uploads>/<namespace>/<YYYYmmdd_HHMMSS>_<name>`.
pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Result<Json<UploadResponse>, ApiError> {
    let mut namespace = DEFAULT_NAMESPACE.to_string();
    let mut files: Vec<(String, Vec<u8>)> = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(|e| ApiError::bad_request(e.to_string()))? {
        let part = field.name().map(str::to_string);
        match part.as_deref() {
            Some("namespace") => namespace = field.text().await.map_err(|e| ApiError::bad_request(e.to_string()))?,
            Some("files" | "files[]" | "file") => {
                let Some(name) = field.file_name().and_then(|n| Path::new(n).file_name()).map(|n| n.to_string_lossy().to_string()) else { continue };
                let bytes = field.bytes().await.map_err(|e| ApiError::bad_request(e.to_string()))?;
                files.push((name, bytes.to_vec()));
            }
            _ => {}
        }
    }
    if files.is_empty() { return Err(ApiError::bad_request("No files provided.")); }

    let folder = namespace_dir(state.indexer.uploads_dir(), &namespace)?;
    let namespace = namespace.trim().to_string();
    tokio::fs::create_dir_all(&folder).await.map_err(Error::from)?;

    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let mut saved = Vec::new();
    for (name, bytes) in files {
        if !is_supported(Path::new(&name)) {
            warn!("Skipping unsupported upload '{}'", name);
            continue;
        }
        let filename = format!("{stamp}_{name}");
        tokio::fs::write(folder.join(&filename), &bytes).await.map_err(Error::from)?;
        let size_kb = (bytes.len() as f64 / 1024.0 * 100.0).round() / 100.0;
        saved.push(SavedFile { filename, size_kb });
    }
    if saved.is_empty() { return Err(ApiError::bad_request("No valid files uploaded (PDF, DOCX, TXT, MD only).")); }
    info!("Saved {} files to namespace '{}'", saved.len(), namespace);
    Ok(Json(UploadResponse { namespace, count: saved.len(), files_saved: saved }))
}

pub async fn ingest_preview(State(state): State<AppState>, Query(params): Query<PreviewParams>) -> Result<Json<PreviewResponse>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_PREVIEW_LIMIT);
    if !(1..=MAX_PREVIEW_LIMIT).contains(&limit) { return Err(ApiError::bad_request(format!("limit must be between 1 and {MAX_PREVIEW_LIMIT}"))); }
    let single_component = Path::new(&params.filename).file_name().is_some_and(|n| n == params.filename.as_str());
    if !single_component { return Err(ApiError::bad_request("filename must be a plain file name")); }

    let path = namespace_dir(state.indexer.uploads_dir(), &params.namespace)?.join(&params.filename);
    if !path.is_file() { return Err(ApiError::not_found("File not found in this namespace")); }

    let namespace = params.namespace.trim().to_string();
    let processor = state.processor.clone();
    let chunks = {
        let namespace = namespace.clone();
        tokio::task::spawn_blocking(move || processor.file_to_chunks(&path, &namespace))
            .await
            .map_err(Error::operation)??
    };
    Ok(Json(PreviewResponse {
        namespace,
        filename: params.filename,
        total_chunks: chunks.len(),
        preview: chunks.iter().take(limit).map(PreviewChunk::from).collect(),
    }))
}
