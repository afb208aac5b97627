use arrow_array::{Array, FixedSizeListArray, Float32Array, Int32Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

use docchat_core::error::{Error, Result};
use docchat_core::types::{Chunk, VectorPoint};

pub fn build_chunk_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("id", DataType::Utf8, false),
		Field::new("namespace", DataType::Utf8, false),
		Field::new("filename", DataType::Utf8, false),
		Field::new("page", DataType::Int32, true),
		Field::new("section", DataType::Utf8, true),
		Field::new("source", DataType::Utf8, true),
		Field::new("text", DataType::Utf8, false),
		Field::new("vector", DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}

pub fn points_to_record_batch(points: &[VectorPoint], dim: i32) -> Result<RecordBatch> {
	let mut ids = Vec::with_capacity(points.len());
	let mut namespaces = Vec::with_capacity(points.len());
	let mut filenames = Vec::with_capacity(points.len());
	let mut pages = Vec::with_capacity(points.len());
	let mut sections = Vec::with_capacity(points.len());
	let mut sources = Vec::with_capacity(points.len());
	let mut texts = Vec::with_capacity(points.len());
	let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(points.len());
	for p in points {
		if p.vector.len() != dim as usize {
			return Err(Error::Embedding(format!("vector for chunk {} has dimension {}, table expects {}", p.chunk.id, p.vector.len(), dim)));
		}
		let c = &p.chunk;
		ids.push(c.id.clone());
		namespaces.push(c.namespace.clone());
		filenames.push(c.filename.clone());
		pages.push(c.page.map(|n| n as i32));
		sections.push(c.section.clone());
		sources.push(c.source.clone());
		texts.push(c.text.clone());
		vectors.push(Some(p.vector.iter().map(|&x| Some(x)).collect()));
	}
	RecordBatch::try_new(build_chunk_schema(dim), vec![
		Arc::new(StringArray::from(ids)),
		Arc::new(StringArray::from(namespaces)),
		Arc::new(StringArray::from(filenames)),
		Arc::new(Int32Array::from(pages)),
		Arc::new(StringArray::from(sections)),
		Arc::new(StringArray::from(sources)),
		Arc::new(StringArray::from(texts)),
		Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors.into_iter(), dim)),
	])
	.map_err(Error::operation)
}

fn string_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
	batch
		.column_by_name(name)
		.and_then(|c| c.as_any().downcast_ref::<StringArray>())
		.ok_or_else(|| Error::RetrievalUnavailable(format!("column '{name}' missing or not utf8")))
}

fn opt_string(col: &StringArray, i: usize) -> Option<String> {
	if col.is_null(i) { None } else { Some(col.value(i).to_string()) }
}

/// Rebuild chunks from a result batch. Extra columns (`vector`, `_distance`) are ignored.
pub fn batch_to_chunks(batch: &RecordBatch) -> Result<Vec<Chunk>> {
	let ids = string_col(batch, "id")?;
	let namespaces = string_col(batch, "namespace")?;
	let filenames = string_col(batch, "filename")?;
	let sections = string_col(batch, "section")?;
	let sources = string_col(batch, "source")?;
	let texts = string_col(batch, "text")?;
	let pages = batch
		.column_by_name("page")
		.and_then(|c| c.as_any().downcast_ref::<Int32Array>())
		.ok_or_else(|| Error::RetrievalUnavailable("column 'page' missing or not int32".into()))?;

	Ok((0..batch.num_rows())
		.map(|i| Chunk {
			id: ids.value(i).to_string(),
			text: texts.value(i).to_string(),
			namespace: namespaces.value(i).to_string(),
			filename: filenames.value(i).to_string(),
			page: if pages.is_null(i) { None } else { u32::try_from(pages.value(i)).ok() },
			section: opt_string(sections, i),
			source: opt_string(sources, i),
		})
		.collect())
}

/// Similarity per row from the cosine `_distance` column.
pub fn batch_similarities(batch: &RecordBatch) -> Result<Vec<f32>> {
	let distances = batch
		.column_by_name("_distance")
		.and_then(|c| c.as_any().downcast_ref::<Float32Array>())
		.ok_or_else(|| Error::RetrievalUnavailable("column '_distance' missing from vector search result".into()))?;
	Ok(distances.iter().map(|d| 1.0 - d.unwrap_or(1.0)).collect())
}
