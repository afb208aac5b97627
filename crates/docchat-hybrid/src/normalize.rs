use std::collections::HashMap;

use docchat_core::types::{Chunk, ChunkKey, IdentityStrategy, ScoredResult};

/// A result rescaled to [0, 1] relative to the min/max of its own list.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedResult {
    pub chunk: Chunk,
    pub score: f32,
}

/// Min/max normalize one result list, keyed by chunk identity.
///
/// A zero span uses a denominator of 1.0, so every score becomes 0.0. When a
/// key repeats, the later entry wins; the bounds still cover every entry.
pub fn normalize(results: &[ScoredResult], identity: IdentityStrategy) -> HashMap<ChunkKey, NormalizedResult> {
    let mut out = HashMap::with_capacity(results.len());
    if results.is_empty() { return out; }
    let lo = results.iter().map(|r| r.score).fold(f32::INFINITY, f32::min);
    let hi = results.iter().map(|r| r.score).fold(f32::NEG_INFINITY, f32::max);
    let span = if hi - lo == 0.0 { 1.0 } else { hi - lo };
    for r in results {
        out.insert(identity.key(&r.chunk), NormalizedResult { chunk: r.chunk.clone(), score: (r.score - lo) / span });
    }
    out
}
