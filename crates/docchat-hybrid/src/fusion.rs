use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;

use docchat_core::types::{Chunk, ChunkKey, IdentityStrategy, ScoredResult, SourceKind};

use crate::normalize::{normalize, NormalizedResult};

/// One fused candidate. Component scores are the normalized values from each
/// list, `None` when the chunk was not retrieved by that path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FusedResult {
    pub chunk: Chunk,
    #[serde(skip)]
    pub key: ChunkKey,
    pub score: f32,
    pub dense_score: Option<f32>,
    pub lexical_score: Option<f32>,
}

impl FusedResult {
    pub fn matched_by(&self) -> Vec<SourceKind> {
        let mut kinds = Vec::with_capacity(2);
        if self.dense_score.is_some() { kinds.push(SourceKind::Dense); }
        if self.lexical_score.is_some() { kinds.push(SourceKind::Lexical); }
        kinds
    }
}

/// Weighted score fusion: `alpha * dense + (1 - alpha) * lexical` over
/// independently normalized lists, 0.0 for a missing side.
///
/// Sorted by fused score descending; equal scores are ordered by ascending
/// [`ChunkKey`]. Returns at most `top_k` results.
pub fn fuse(dense: &[ScoredResult], lexical: &[ScoredResult], alpha: f32, top_k: usize, identity: IdentityStrategy) -> Vec<FusedResult> {
    let mut dense_n = normalize(dense, identity);
    let mut lexical_n = normalize(lexical, identity);

    let keys: HashSet<ChunkKey> = dense_n.keys().chain(lexical_n.keys()).cloned().collect();
    let mut fused: Vec<FusedResult> = keys
        .into_iter()
        .filter_map(|key| {
            let d = dense_n.remove(&key);
            let l = lexical_n.remove(&key);
            let dense_score = d.as_ref().map(|r| r.score);
            let lexical_score = l.as_ref().map(|r| r.score);
            let score = alpha * dense_score.unwrap_or(0.0) + (1.0 - alpha) * lexical_score.unwrap_or(0.0);
            // payload from the dense side when present
            let NormalizedResult { chunk, .. } = d.or(l)?;
            Some(FusedResult { chunk, key, score, dense_score, lexical_score })
        })
        .collect();

    fused.sort_by(|a, b| match b.score.total_cmp(&a.score) {
        Ordering::Equal => a.key.cmp(&b.key),
        ord => ord,
    });
    fused.truncate(top_k);
    fused
}

