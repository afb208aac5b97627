use async_trait::async_trait;
use parking_lot::RwLock;

use docchat_core::error::Result;
use docchat_core::traits::{ChunkSource, VectorStore};
use docchat_core::types::{ScoredResult, ScrollCursor, ScrollPage, VectorPoint};

/// In-process cosine store; insertion order is kept for scrolling.
#[derive(Default)]
pub struct MemoryVectorStore {
	points: RwLock<Vec<VectorPoint>>,
}

impl MemoryVectorStore {
	pub fn new() -> Self { Self::default() }

	pub fn len(&self) -> usize { self.points.read().len() }

	pub fn is_empty(&self) -> bool { self.points.read().is_empty() }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
	let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
	let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
	let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
	if na == 0.0 || nb == 0.0 { 0.0 } else { dot / (na * nb) }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
	async fn upsert(&self, points: &[VectorPoint]) -> Result<()> {
		let mut stored = self.points.write();
		for p in points {
			match stored.iter_mut().find(|s| s.chunk.id == p.chunk.id) {
				Some(existing) => *existing = p.clone(),
				None => stored.push(p.clone()),
			}
		}
		Ok(())
	}

	async fn search(&self, vector: &[f32], namespace: &str, limit: usize) -> Result<Vec<ScoredResult>> {
		let mut hits: Vec<ScoredResult> = self
			.points
			.read()
			.iter()
			.filter(|p| p.chunk.namespace == namespace)
			.map(|p| ScoredResult::new(p.chunk.clone(), cosine_similarity(vector, &p.vector)))
			.collect();
		hits.sort_by(|a, b| b.score.total_cmp(&a.score));
		hits.truncate(limit);
		Ok(hits)
	}
}

#[async_trait]
impl ChunkSource for MemoryVectorStore {
	async fn scroll(&self, namespace: &str, page_size: usize, cursor: Option<ScrollCursor>) -> Result<ScrollPage> {
		let offset = cursor.map_or(0, |c| c.offset as usize);
		let stored = self.points.read();
		let mut in_ns = stored.iter().filter(|p| p.chunk.namespace == namespace).skip(offset);
		let chunks: Vec<_> = in_ns.by_ref().take(page_size).map(|p| p.chunk.clone()).collect();
		let next_cursor = if in_ns.next().is_some() { Some(ScrollCursor::at((offset + chunks.len()) as u64)) } else { None };
		Ok(ScrollPage { chunks, next_cursor })
	}
}
