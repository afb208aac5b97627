use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tantivy::collector::TopDocs;
use tantivy::directory::MmapDirectory;
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::{IndexRecordOption, Value};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tracing::{debug, info};

use docchat_core::error::{Error, Result};
use docchat_core::traits::LexicalIndex;
use docchat_core::types::{Chunk, ScoredResult};

use crate::tantivy_utils::{build_schema, namespace_dir_name, register_tokenizer, ChunkFields};

const WRITER_MEMORY: usize = 50_000_000;

/// Inverted index holding the chunks of a single namespace, so term
/// statistics never mix tenants.
struct NamespaceIndex {
	reader: IndexReader,
	writer: Mutex<IndexWriter>,
	fields: ChunkFields,
}

impl NamespaceIndex {
	fn open(dir: Option<&Path>) -> Result<Self> {
		let (schema, fields) = build_schema();
		let index = match dir {
			Some(dir) => {
				std::fs::create_dir_all(dir)?;
				let mmap = MmapDirectory::open(dir).map_err(Error::operation)?;
				Index::open_or_create(mmap, schema).map_err(Error::operation)?
			}
			None => Index::create_in_ram(schema),
		};
		register_tokenizer(&index);
		let writer = index.writer(WRITER_MEMORY).map_err(Error::operation)?;
		let reader: IndexReader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into().map_err(Error::operation)?;
		Ok(Self { reader, writer: Mutex::new(writer), fields })
	}

	fn num_docs(&self) -> u64 { self.reader.searcher().num_docs() }

	/// Replace-or-insert by chunk id, then commit and refresh the reader.
	fn write(&self, chunks: &[Chunk]) -> Result<()> {
		{
			let mut writer = self.writer.lock();
			for c in chunks {
				let payload = serde_json::to_string(c).map_err(Error::operation)?;
				writer.delete_term(Term::from_field_text(self.fields.id, &c.id));
				writer.add_document(doc!(
					self.fields.id => c.id.clone(),
					self.fields.text => c.text.clone(),
					self.fields.payload => payload,
				)).map_err(Error::operation)?;
			}
			writer.commit().map_err(Error::operation)?;
		}
		self.reader.reload().map_err(Error::operation)
	}

	fn search(&self, tokens: &[&str], limit: usize) -> Result<Vec<ScoredResult>> {
		let any_term: Vec<(Occur, Box<dyn Query>)> = tokens
			.iter()
			.map(|t| (Occur::Should, Box::new(TermQuery::new(Term::from_field_text(self.fields.text, t), IndexRecordOption::WithFreqs)) as Box<dyn Query>))
			.collect();
		let searcher = self.reader.searcher();
		let top_docs = searcher.search(&BooleanQuery::new(any_term), &TopDocs::with_limit(limit)).map_err(Error::retrieval)?;
		let mut hits = Vec::with_capacity(top_docs.len());
		for (score, addr) in top_docs {
			let doc: TantivyDocument = searcher.doc(addr).map_err(Error::retrieval)?;
			let Some(payload) = doc.get_first(self.fields.payload).and_then(|v| v.as_str()) else { continue };
			let chunk: Chunk = serde_json::from_str(payload).map_err(Error::retrieval)?;
			hits.push(ScoredResult::new(chunk, score));
		}
		Ok(hits)
	}
}

/// Namespace indexes opened so far. `root` is `None` for RAM indexes.
struct Shards {
	root: Option<PathBuf>,
	open: Mutex<HashMap<String, Arc<NamespaceIndex>>>,
}

impl Shards {
	fn get_or_create(&self, namespace: &str) -> Result<Arc<NamespaceIndex>> {
		let mut open = self.open.lock();
		if let Some(idx) = open.get(namespace) { return Ok(idx.clone()); }
		let dir = self.root.as_ref().map(|r| r.join(namespace_dir_name(namespace)));
		let idx = Arc::new(NamespaceIndex::open(dir.as_deref())?);
		open.insert(namespace.to_string(), idx.clone());
		Ok(idx)
	}

	/// The namespace's index if it was ever written; never creates one.
	fn existing(&self, namespace: &str) -> Result<Option<Arc<NamespaceIndex>>> {
		let exists = match &self.root {
			Some(root) => root.join(namespace_dir_name(namespace)).is_dir(),
			None => false,
		};
		if !exists && !self.open.lock().contains_key(namespace) { return Ok(None); }
		self.get_or_create(namespace).map(Some)
	}
}

/// Persistent inverted indexes, one per namespace, maintained at ingest time.
///
/// On disk each namespace lives in its own directory under the root. Tantivy
/// work runs on the blocking thread pool.
#[derive(Clone)]
pub struct TantivyLexicalIndex {
	shards: Arc<Shards>,
}

impl TantivyLexicalIndex {
	/// Use `index_dir` as the root of the per-namespace indexes, creating it
	/// when absent. Namespace indexes are opened on first use.
	pub fn open(index_dir: &Path) -> Result<Self> {
		std::fs::create_dir_all(index_dir)?;
		info!("Opened lexical index root at {}", index_dir.display());
		Ok(Self::with_root(Some(index_dir.to_path_buf())))
	}

	pub fn in_memory() -> Result<Self> { Ok(Self::with_root(None)) }

	fn with_root(root: Option<PathBuf>) -> Self {
		Self { shards: Arc::new(Shards { root, open: Mutex::new(HashMap::new()) }) }
	}

	/// Documents in `namespace`, counting only indexes opened by this process.
	pub fn num_docs(&self, namespace: &str) -> u64 {
		self.shards.open.lock().get(namespace).map_or(0, |idx| idx.num_docs())
	}
}

#[async_trait]
impl LexicalIndex for TantivyLexicalIndex {
	async fn index(&self, chunks: &[Chunk]) -> Result<()> {
		if chunks.is_empty() { return Ok(()); }
		let mut by_namespace: BTreeMap<String, Vec<Chunk>> = BTreeMap::new();
		for c in chunks {
			by_namespace.entry(c.namespace.clone()).or_default().push(c.clone());
		}
		let shards = self.shards.clone();
		tokio::task::spawn_blocking(move || -> Result<()> {
			for (namespace, chunks) in by_namespace {
				shards.get_or_create(&namespace)?.write(&chunks)?;
				debug!("Indexed {} chunks into lexical index of '{}'", chunks.len(), namespace);
			}
			Ok(())
		})
		.await
		.map_err(Error::operation)?
	}

	async fn search(&self, query: &str, namespace: &str, limit: usize) -> Result<Vec<ScoredResult>> {
		if query.split_whitespace().next().is_none() || limit == 0 { return Ok(vec![]); }
		let shards = self.shards.clone();
		let (query, namespace) = (query.to_string(), namespace.to_string());
		tokio::task::spawn_blocking(move || -> Result<Vec<ScoredResult>> {
			let Some(idx) = shards.existing(&namespace)? else { return Ok(vec![]) };
			let tokens: Vec<&str> = query.split_whitespace().collect();
			let hits = idx.search(&tokens, limit)?;
			debug!("tantivy search ns='{}' q='{}': {} results", namespace, query, hits.len());
			Ok(hits)
		})
		.await
		.map_err(Error::retrieval)?
	}
}
