use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use docchat_core::config::RetrievalSettings;
use docchat_core::error::{Error, Result};
use docchat_core::traits::{Embedder, LexicalIndex, Retriever, VectorStore};
use docchat_core::types::{Chunk, ContextItem, IdentityStrategy, VectorPoint};
use docchat_vector::DenseRetriever;

use crate::fusion::{fuse, FusedResult};

pub const DEFAULT_CANDIDATE_FLOOR: usize = 20;
pub const DEFAULT_EMBED_BATCH: usize = 32;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexCounts {
    pub chunks: usize,
    pub points_upserted: usize,
}

/// Dense and lexical retrieval over one namespace, fused into a single ranking.
pub struct HybridRetriever {
    embedder: Arc<dyn Embedder>,
    dense: DenseRetriever,
    lexical: Arc<dyn LexicalIndex>,
    candidate_floor: usize,
    identity: IdentityStrategy,
    batch_size: usize,
}

impl HybridRetriever {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>, lexical: Arc<dyn LexicalIndex>) -> Self {
        Self {
            embedder,
            dense: DenseRetriever::new(store),
            lexical,
            candidate_floor: DEFAULT_CANDIDATE_FLOOR,
            identity: IdentityStrategy::default(),
            batch_size: DEFAULT_EMBED_BATCH,
        }
    }

    pub fn with_settings(mut self, settings: &RetrievalSettings) -> Self {
        self.candidate_floor = settings.candidate_floor.max(1);
        self.identity = settings.identity;
        self
    }

    pub fn with_identity(mut self, identity: IdentityStrategy) -> Self { self.identity = identity; self }

    pub fn with_candidate_floor(mut self, floor: usize) -> Self { self.candidate_floor = floor.max(1); self }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self { self.batch_size = batch_size.max(1); self }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        self.embedder
            .embed_batch(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("no embedding returned for query".into()))
    }

    /// Fused, scored results for `query` within `namespace`.
    pub async fn search(&self, query: &str, namespace: &str, top_k: usize, alpha: f32) -> Result<Vec<FusedResult>> {
        if query.trim().is_empty() { return Err(Error::InvalidRequest("query must not be empty".into())); }
        if top_k == 0 { return Err(Error::InvalidRequest("top_k must be at least 1".into())); }
        if !(0.0..=1.0).contains(&alpha) { return Err(Error::InvalidRequest(format!("alpha must be within [0, 1], got {alpha}"))); }

        let q_vec = self.embed_query(query).await.map_err(unavailable)?;
        let candidates = top_k.max(self.candidate_floor);
        let lexical = async { self.lexical.search(query, namespace, candidates).await.map_err(unavailable) };
        let (dense_hits, lexical_hits) = tokio::try_join!(self.dense.search(&q_vec, namespace, candidates), lexical)?;

        let fused = fuse(&dense_hits, &lexical_hits, alpha, top_k, self.identity);
        debug!(
            "hybrid search ns='{}' dense={} lexical={} fused={} (alpha {}, top_k {})",
            namespace,
            dense_hits.len(),
            lexical_hits.len(),
            fused.len(),
            alpha,
            top_k
        );
        Ok(fused)
    }

    /// Embed in batches; each batch is upserted as vector points and then
    /// added to the lexical index before the next one starts. On failure the
    /// earlier batches stay indexed in both stores; chunk ids are content
    /// hashes, so running the same input again completes the rest.
    pub async fn index(&self, chunks: &[Chunk]) -> Result<IndexCounts> {
        let mut counts = IndexCounts { chunks: chunks.len(), points_upserted: 0 };
        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts).await?;
            if vectors.len() != batch.len() {
                return Err(Error::Embedding(format!("expected {} embeddings, got {}", batch.len(), vectors.len())));
            }
            let points: Vec<VectorPoint> = batch.iter().cloned().zip(vectors).map(|(chunk, vector)| VectorPoint { chunk, vector }).collect();
            self.dense.store().upsert(&points).await?;
            self.lexical.index(batch).await?;
            counts.points_upserted += points.len();
        }
        Ok(counts)
    }
}

fn unavailable(e: Error) -> Error {
    match e {
        Error::RetrievalUnavailable(_) => e,
        other => Error::retrieval(other),
    }
}

#[async_trait]
impl Retriever for HybridRetriever {
    async fn retrieve(&self, query: &str, namespace: &str, top_k: usize, alpha: f32) -> Result<Vec<ContextItem>> {
        let fused = self.search(query, namespace, top_k, alpha).await?;
        Ok(fused.iter().map(|r| ContextItem::from(&r.chunk)).collect())
    }
}
