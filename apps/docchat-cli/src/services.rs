//! Builds the retrieval, indexing and chat services from [`Settings`].
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use docchat_chat::{ChatService, GeminiGenerator, InMemoryHistory};
use docchat_core::config::{LexicalBackend, Settings};
use docchat_core::ingest::DataProcessor;
use docchat_core::traits::LexicalIndex;
use docchat_embed::embedder_from_settings;
use docchat_hybrid::{HybridRetriever, NamespaceIndexer};
use docchat_text::{ScrollBm25Index, TantivyLexicalIndex};
use docchat_vector::LanceVectorStore;

use crate::http::AppState;

/// Base directory for relative data paths: the working directory.
pub fn base_dir() -> Result<PathBuf> { std::env::current_dir().context("Failed to read current directory") }

pub async fn build_retriever(settings: &Settings, base: &Path) -> Result<Arc<HybridRetriever>> {
    let embedder = embedder_from_settings(&settings.embedding)?;
    let store = Arc::new(
        LanceVectorStore::open(&settings.data.lancedb_path(base), &settings.data.collection, settings.embedding.dim)
            .await
            .context("Failed to open vector store")?,
    );
    let lexical: Arc<dyn LexicalIndex> = match settings.retrieval.lexical {
        LexicalBackend::Tantivy => {
            Arc::new(TantivyLexicalIndex::open(&settings.data.tantivy_path(base)).context("Failed to open lexical index")?)
        }
        LexicalBackend::Scroll => Arc::new(ScrollBm25Index::new(store.clone()).with_page_size(settings.retrieval.scroll_page_size)),
    };
    info!("Retrieval ready: lexical backend {:?}, identity {:?}", settings.retrieval.lexical, settings.retrieval.identity);
    Ok(Arc::new(
        HybridRetriever::new(embedder, store, lexical)
            .with_settings(&settings.retrieval)
            .with_batch_size(settings.embedding.batch_size),
    ))
}

pub fn build_indexer(settings: &Settings, base: &Path, retriever: Arc<HybridRetriever>) -> NamespaceIndexer {
    NamespaceIndexer::new(DataProcessor::with_chunking(settings.chunking.clone()), retriever, settings.data.uploads_path(base))
}

pub async fn build_app_state(settings: &Settings, base: &Path) -> Result<AppState> {
    let retriever = build_retriever(settings, base).await?;
    let generator = Arc::new(GeminiGenerator::from_settings(&settings.generation)?);
    let history = Arc::new(InMemoryHistory::new(settings.history.capacity));
    let chat = ChatService::new(retriever.clone(), generator, history).with_recent_turns(settings.history.recent_turns);
    let indexer = build_indexer(settings, base, retriever.clone());
    Ok(AppState::new(retriever, Arc::new(chat), Arc::new(indexer), DataProcessor::with_chunking(settings.chunking.clone())))
}
