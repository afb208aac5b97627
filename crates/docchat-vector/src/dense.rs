use std::sync::Arc;
use tracing::{debug, warn};

use docchat_core::error::{Error, Result};
use docchat_core::traits::VectorStore;
use docchat_core::types::ScoredResult;

/// Namespace-scoped nearest-neighbour search over a [`VectorStore`].
///
/// The store is asked to filter by namespace; any hit that still carries a
/// different namespace is dropped here. Results are most similar first.
#[derive(Clone)]
pub struct DenseRetriever {
	store: Arc<dyn VectorStore>,
}

impl DenseRetriever {
	pub fn new(store: Arc<dyn VectorStore>) -> Self { Self { store } }

	pub fn store(&self) -> &Arc<dyn VectorStore> { &self.store }

	pub async fn search(&self, query_vector: &[f32], namespace: &str, limit: usize) -> Result<Vec<ScoredResult>> {
		if limit == 0 { return Ok(vec![]); }
		let raw = self.store.search(query_vector, namespace, limit).await.map_err(|e| match e {
			Error::RetrievalUnavailable(_) => e,
			other => Error::retrieval(other),
		})?;
		let before = raw.len();
		let mut hits: Vec<ScoredResult> = raw.into_iter().filter(|h| h.chunk.namespace == namespace).collect();
		if hits.len() != before {
			warn!("Dropped {} vector hits outside namespace '{}'", before - hits.len(), namespace);
		}
		hits.sort_by(|a, b| b.score.total_cmp(&a.score));
		hits.truncate(limit);
		debug!("dense search ns='{}': {} results", namespace, hits.len());
		Ok(hits)
	}
}
