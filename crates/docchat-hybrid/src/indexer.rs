use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use docchat_core::error::{Error, Result};
use docchat_core::ingest::DataProcessor;

use crate::retriever::HybridRetriever;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexSummary {
    pub namespace: String,
    pub files_indexed: usize,
    pub chunks_processed: usize,
    pub points_upserted: usize,
}

/// Directory holding the uploads of `namespace`. Rejects blank names and
/// anything that is not a single path component.
pub fn namespace_dir(uploads_dir: &Path, namespace: &str) -> Result<PathBuf> {
    let ns = namespace.trim();
    if ns.is_empty() { return Err(Error::InvalidRequest("namespace required".into())); }
    if ns == "." || ns == ".." || ns.contains(['/', '\\']) {
        return Err(Error::InvalidRequest(format!("invalid namespace '{ns}'")));
    }
    Ok(uploads_dir.join(ns))
}

/// Rebuilds the retrieval indexes for every uploaded file of a namespace.
pub struct NamespaceIndexer {
    processor: DataProcessor,
    retriever: Arc<HybridRetriever>,
    uploads_dir: PathBuf,
}

impl NamespaceIndexer {
    pub fn new(processor: DataProcessor, retriever: Arc<HybridRetriever>, uploads_dir: PathBuf) -> Self {
        Self { processor, retriever, uploads_dir }
    }

    pub fn uploads_dir(&self) -> &Path { &self.uploads_dir }

    pub async fn index_namespace(&self, namespace: &str) -> Result<IndexSummary> {
        let dir = namespace_dir(&self.uploads_dir, namespace)?;
        let namespace = namespace.trim();
        let mut summary = IndexSummary { namespace: namespace.to_string(), files_indexed: 0, chunks_processed: 0, points_upserted: 0 };

        for path in self.processor.list_files(&dir) {
            let chunks = match self.processor.file_to_chunks(&path, namespace) {
                Ok(chunks) => chunks,
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            summary.files_indexed += 1;
            if chunks.is_empty() { continue; }
            let counts = self.retriever.index(&chunks).await?;
            summary.chunks_processed += counts.chunks;
            summary.points_upserted += counts.points_upserted;
        }
        info!(
            "Indexed namespace '{}': {} files, {} chunks, {} points",
            summary.namespace, summary.files_indexed, summary.chunks_processed, summary.points_upserted
        );
        Ok(summary)
    }
}
