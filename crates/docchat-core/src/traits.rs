use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Chunk, ContextItem, ScoredResult, ScrollCursor, ScrollPage, Turn, VectorPoint};

#[async_trait]
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    /// One vector per input, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// External similarity index.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn upsert(&self, points: &[VectorPoint]) -> Result<()>;
    /// Nearest neighbours restricted to `namespace`, most similar first.
    async fn search(&self, vector: &[f32], namespace: &str, limit: usize) -> Result<Vec<ScoredResult>>;
}

/// Paginated read access to every chunk of a namespace.
#[async_trait]
pub trait ChunkSource: Send + Sync {
    async fn scroll(&self, namespace: &str, page_size: usize, cursor: Option<ScrollCursor>) -> Result<ScrollPage>;
}

/// Keyword relevance ranking over a namespace corpus.
#[async_trait]
pub trait LexicalIndex: Send + Sync {
    /// Make freshly ingested chunks searchable.
    async fn index(&self, chunks: &[Chunk]) -> Result<()>;
    async fn search(&self, query: &str, namespace: &str, limit: usize) -> Result<Vec<ScoredResult>>;
}

/// Ranked grounding context for a question, restricted to one namespace.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str, namespace: &str, top_k: usize, alpha: f32) -> Result<Vec<ContextItem>>;
}

#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Capped, append-only conversation log per namespace.
pub trait HistoryStore: Send + Sync {
    fn append(&self, namespace: &str, turn: Turn);
    /// The last `max_turns` turns, oldest first.
    fn recent(&self, namespace: &str, max_turns: usize) -> Vec<Turn>;
}
