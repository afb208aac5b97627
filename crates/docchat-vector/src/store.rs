use arrow_array::RecordBatchIterator;
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType, Table};
use std::path::Path;
use tracing::{debug, info};

use docchat_core::error::{Error, Result};
use docchat_core::traits::{ChunkSource, VectorStore};
use docchat_core::types::{ScoredResult, ScrollCursor, ScrollPage, VectorPoint};

use crate::schema::{batch_similarities, batch_to_chunks, build_chunk_schema, points_to_record_batch};
use crate::table::{ensure_table, namespace_predicate, open_db, open_table};

/// One LanceDB table holding every namespace's chunks and embeddings.
pub struct LanceVectorStore {
	db: Connection,
	table_name: String,
	dim: i32,
}

impl LanceVectorStore {
	pub async fn open(db_path: &Path, table_name: &str, dim: usize) -> Result<Self> {
		std::fs::create_dir_all(db_path)?;
		let db = open_db(db_path.to_string_lossy().as_ref()).await?;
		let dim = i32::try_from(dim).map_err(|_| Error::InvalidConfig(format!("embedding dimension {dim} too large")))?;
		info!("Opened LanceDB at {} (table '{}', dim {})", db_path.display(), table_name, dim);
		Ok(Self { db, table_name: table_name.to_string(), dim })
	}

	async fn table(&self) -> Result<Option<Table>> { open_table(&self.db, &self.table_name).await }

	/// Number of stored points across all namespaces.
	pub async fn count(&self) -> Result<usize> {
		match self.table().await? {
			Some(t) => t.count_rows(None).await.map_err(Error::retrieval),
			None => Ok(0),
		}
	}
}

#[async_trait]
impl VectorStore for LanceVectorStore {
	async fn upsert(&self, points: &[VectorPoint]) -> Result<()> {
		if points.is_empty() { return Ok(()); }
		let schema = build_chunk_schema(self.dim);
		let table = ensure_table(&self.db, &self.table_name, schema.clone()).await?;
		let batch = points_to_record_batch(points, self.dim)?;
		let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
		// id is a content hash, so re-ingesting a chunk replaces its row
		let mut mi = table.merge_insert(&["id"]);
		mi.when_matched_update_all(None).when_not_matched_insert_all();
		mi.execute(reader).await.map_err(Error::retrieval)?;
		debug!("Upserted {} points into '{}'", points.len(), self.table_name);
		Ok(())
	}

	async fn search(&self, vector: &[f32], namespace: &str, limit: usize) -> Result<Vec<ScoredResult>> {
		if limit == 0 { return Ok(vec![]); }
		let Some(table) = self.table().await? else { return Ok(vec![]) };
		let mut stream = table
			.vector_search(vector.to_vec())
			.map_err(Error::retrieval)?
			.distance_type(DistanceType::Cosine)
			.only_if(namespace_predicate(namespace))
			.limit(limit)
			.execute()
			.await
			.map_err(Error::retrieval)?;
		let mut hits = Vec::new();
		while let Some(batch) = stream.try_next().await.map_err(Error::retrieval)? {
			let chunks = batch_to_chunks(&batch)?;
			let sims = batch_similarities(&batch)?;
			hits.extend(chunks.into_iter().zip(sims).map(|(c, s)| ScoredResult::new(c, s)));
		}
		Ok(hits)
	}
}

#[async_trait]
impl ChunkSource for LanceVectorStore {
	async fn scroll(&self, namespace: &str, page_size: usize, cursor: Option<ScrollCursor>) -> Result<ScrollPage> {
		let Some(table) = self.table().await? else { return Ok(ScrollPage::default()) };
		// every page reads the table version the first page saw
		let snapshot = match cursor.and_then(|c| c.snapshot) {
			Some(version) => {
				table.checkout(version).await.map_err(Error::retrieval)?;
				version
			}
			None => table.version().await.map_err(Error::retrieval)?,
		};
		let offset = cursor.map_or(0, |c| c.offset as usize);
		let mut stream = table
			.query()
			.only_if(namespace_predicate(namespace))
			.limit(page_size)
			.offset(offset)
			.execute()
			.await
			.map_err(Error::retrieval)?;
		let mut chunks = Vec::new();
		while let Some(batch) = stream.try_next().await.map_err(Error::retrieval)? {
			chunks.extend(batch_to_chunks(&batch)?);
		}
		// a short page means the scan is exhausted
		let next_cursor = if chunks.len() < page_size { None } else { Some(ScrollCursor::pinned((offset + chunks.len()) as u64, snapshot)) };
		Ok(ScrollPage { chunks, next_cursor })
	}
}
