//! Lexical adapter that rebuilds a BM25 model from the namespace corpus on
//! every query. Cost is O(namespace size) per search.
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use docchat_core::error::Result;
use docchat_core::traits::{ChunkSource, LexicalIndex};
use docchat_core::types::{Chunk, ScoredResult};

use crate::bm25::{tokenize, Bm25Okapi, Bm25Params};

pub const DEFAULT_PAGE_SIZE: usize = 256;

pub struct ScrollBm25Index {
    source: Arc<dyn ChunkSource>,
    page_size: usize,
    params: Bm25Params,
}

impl ScrollBm25Index {
    pub fn new(source: Arc<dyn ChunkSource>) -> Self { Self { source, page_size: DEFAULT_PAGE_SIZE, params: Bm25Params::default() } }

    pub fn with_page_size(mut self, page_size: usize) -> Self { self.page_size = page_size.max(1); self }

    pub fn with_params(mut self, params: Bm25Params) -> Self { self.params = params; self }

    /// Every chunk of `namespace` with non-empty text. All pages are fetched
    /// before returning.
    pub async fn load_corpus(&self, namespace: &str) -> Result<Vec<Chunk>> {
        let mut corpus = Vec::new();
        let mut cursor = None;
        loop {
            let page = self.source.scroll(namespace, self.page_size, cursor).await?;
            let fetched = page.chunks.len();
            corpus.extend(page.chunks.into_iter().filter(|c| !c.text.is_empty()));
            match page.next_cursor {
                None => break,
                Some(_) if fetched == 0 => {
                    warn!("chunk source returned an empty page with a cursor for namespace '{}'; stopping scroll", namespace);
                    break;
                }
                next => cursor = next,
            }
        }
        Ok(corpus)
    }
}

#[async_trait]
impl LexicalIndex for ScrollBm25Index {
    async fn index(&self, _chunks: &[Chunk]) -> Result<()> {
        // The corpus is read back from the chunk source at query time.
        Ok(())
    }

    async fn search(&self, query: &str, namespace: &str, limit: usize) -> Result<Vec<ScoredResult>> {
        let corpus = self.load_corpus(namespace).await?;
        if corpus.is_empty() { return Ok(vec![]); }
        let scores = {
            let tokenized: Vec<Vec<&str>> = corpus.iter().map(|c| tokenize(&c.text)).collect();
            Bm25Okapi::with_params(&tokenized, self.params).scores(&tokenize(query))
        };

        let mut ranked: Vec<ScoredResult> = corpus.into_iter().zip(scores).map(|(chunk, s)| ScoredResult::new(chunk, s as f32)).collect();
        // stable: equal scores keep corpus order
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(limit);
        debug!("bm25 scroll search ns='{}': {} results", namespace, ranked.len());
        Ok(ranked)
    }
}
