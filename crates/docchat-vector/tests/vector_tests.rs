use async_trait::async_trait;
use std::sync::Arc;
use tempfile::TempDir;

use docchat_core::error::{Error, Result};
use docchat_core::traits::{ChunkSource, Embedder, VectorStore};
use docchat_core::types::{Chunk, ScoredResult, ScrollCursor, VectorPoint};
use docchat_embed::FakeEmbedder;
use docchat_vector::{DenseRetriever, LanceVectorStore, MemoryVectorStore};

const DIM: usize = 32;

async fn points(embedder: &FakeEmbedder, chunks: Vec<Chunk>) -> Vec<VectorPoint> {
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let vectors = embedder.embed_batch(&texts).await.expect("embed");
    chunks.into_iter().zip(vectors).map(|(chunk, vector)| VectorPoint { chunk, vector }).collect()
}

fn fixture() -> Vec<Chunk> {
    vec![
        Chunk::new("solar panels convert sunlight", "ns1", "energy.pdf", Some(1)),
        Chunk::new("wind turbines spin in storms", "ns1", "energy.pdf", Some(2)),
        Chunk::new("solar panels convert sunlight", "ns2", "copy.pdf", Some(1)),
    ]
}

/// Returns its canned hits regardless of the requested namespace.
struct LeakyStore(Vec<ScoredResult>);

#[async_trait]
impl VectorStore for LeakyStore {
    async fn upsert(&self, _: &[VectorPoint]) -> Result<()> { Ok(()) }
    async fn search(&self, _: &[f32], _: &str, _: usize) -> Result<Vec<ScoredResult>> { Ok(self.0.clone()) }
}

struct BrokenStore;

#[async_trait]
impl VectorStore for BrokenStore {
    async fn upsert(&self, _: &[VectorPoint]) -> Result<()> { Err(Error::Operation("down".into())) }
    async fn search(&self, _: &[f32], _: &str, _: usize) -> Result<Vec<ScoredResult>> { Err(Error::Operation("down".into())) }
}

#[tokio::test]
async fn memory_store_search_stays_in_namespace() {
    let embedder = FakeEmbedder::new(DIM);
    let store = Arc::new(MemoryVectorStore::new());
    store.upsert(&points(&embedder, fixture()).await).await.unwrap();
    let dense = DenseRetriever::new(store.clone());

    let q = embedder.embed_text("solar panels");
    let ns1 = dense.search(&q, "ns1", 10).await.unwrap();
    assert_eq!(ns1.len(), 2);
    assert!(ns1.iter().all(|h| h.chunk.namespace == "ns1"));
    assert_eq!(ns1[0].chunk.page, Some(1));
    assert!(ns1[0].score >= ns1[1].score);

    let ns2 = dense.search(&q, "ns2", 10).await.unwrap();
    assert_eq!(ns2.len(), 1);
    assert_eq!(ns2[0].chunk.filename, "copy.pdf");
    assert!(dense.search(&q, "ns3", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn memory_store_upsert_replaces_by_id_and_scrolls() {
    let embedder = FakeEmbedder::new(DIM);
    let store = MemoryVectorStore::new();
    let pts = points(&embedder, fixture()).await;
    store.upsert(&pts).await.unwrap();
    store.upsert(&pts).await.unwrap();
    assert_eq!(store.len(), 3);

    let first = store.scroll("ns1", 1, None).await.unwrap();
    assert_eq!(first.chunks.len(), 1);
    assert_eq!(first.next_cursor, Some(ScrollCursor::at(1)));
    let second = store.scroll("ns1", 1, first.next_cursor).await.unwrap();
    assert_eq!(second.chunks.len(), 1);
    assert_eq!(second.next_cursor, None);
    assert_ne!(first.chunks[0].id, second.chunks[0].id);
}

#[tokio::test]
async fn dense_retriever_drops_foreign_hits_and_orders() {
    let hits = vec![
        ScoredResult::new(Chunk::new("a", "ns1", "a.txt", None), 0.2),
        ScoredResult::new(Chunk::new("b", "other", "b.txt", None), 0.99),
        ScoredResult::new(Chunk::new("c", "ns1", "c.txt", None), 0.7),
    ];
    let dense = DenseRetriever::new(Arc::new(LeakyStore(hits)));
    let out = dense.search(&[0.0; 4], "ns1", 10).await.unwrap();
    let names: Vec<&str> = out.iter().map(|h| h.chunk.filename.as_str()).collect();
    assert_eq!(names, vec!["c.txt", "a.txt"]);

    assert_eq!(dense.search(&[0.0; 4], "ns1", 1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn dense_retriever_reports_store_failure_as_unavailable() {
    let dense = DenseRetriever::new(Arc::new(BrokenStore));
    let err = dense.search(&[0.0; 4], "ns1", 5).await.unwrap_err();
    assert!(matches!(err, Error::RetrievalUnavailable(_)));
}

#[tokio::test]
async fn lance_store_missing_table_is_empty() {
    let tmp = TempDir::new().unwrap();
    let store = LanceVectorStore::open(tmp.path(), "docs", DIM).await.expect("open");
    assert!(store.search(&vec![0.1; DIM], "ns1", 5).await.unwrap().is_empty());
    let page = store.scroll("ns1", 10, None).await.unwrap();
    assert!(page.chunks.is_empty());
    assert_eq!(page.next_cursor, None);
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn lance_store_upsert_search_and_scroll() {
    let tmp = TempDir::new().unwrap();
    let embedder = FakeEmbedder::new(DIM);
    let store = Arc::new(LanceVectorStore::open(tmp.path(), "docs", DIM).await.expect("open"));
    let pts = points(&embedder, fixture()).await;
    store.upsert(&pts).await.expect("upsert");
    store.upsert(&pts).await.expect("re-upsert");
    assert_eq!(store.count().await.unwrap(), 3, "merge on id keeps one row per chunk");

    let dense = DenseRetriever::new(store.clone());
    let q = embedder.embed_text("solar panels convert sunlight");
    let ns1 = dense.search(&q, "ns1", 5).await.expect("search");
    assert_eq!(ns1.len(), 2);
    assert_eq!(ns1[0].chunk, fixture()[0]);
    assert!((ns1[0].score - 1.0).abs() < 1e-3, "identical text has cosine similarity 1");

    let ns2 = dense.search(&q, "ns2", 5).await.unwrap();
    assert_eq!(ns2.len(), 1);
    assert_eq!(ns2[0].chunk.namespace, "ns2");

    let mut seen = Vec::new();
    let mut cursor = None;
    loop {
        let page = store.scroll("ns1", 1, cursor).await.unwrap();
        seen.extend(page.chunks);
        match page.next_cursor { Some(c) => cursor = Some(c), None => break }
    }
    seen.sort_by(|a, b| a.page.cmp(&b.page));
    assert_eq!(seen, fixture()[..2].to_vec());
}

#[tokio::test]
async fn lance_scroll_pages_come_from_one_table_version() {
    let tmp = TempDir::new().unwrap();
    let embedder = FakeEmbedder::new(DIM);
    let store = LanceVectorStore::open(tmp.path(), "docs", DIM).await.expect("open");
    store.upsert(&points(&embedder, fixture()).await).await.expect("upsert");

    let first = store.scroll("ns1", 1, None).await.unwrap();
    let cursor = first.next_cursor.expect("second page pending");
    assert!(cursor.snapshot.is_some());

    let late = vec![
        Chunk::new("geothermal heat pumps", "ns1", "late.txt", None),
        Chunk::new("tidal power barrages", "ns1", "late.txt", None),
    ];
    store.upsert(&points(&embedder, late).await).await.expect("concurrent write");

    let mut seen = first.chunks;
    let mut next = Some(cursor);
    while let Some(c) = next {
        let page = store.scroll("ns1", 1, Some(c)).await.unwrap();
        seen.extend(page.chunks);
        next = page.next_cursor;
    }
    seen.sort_by(|a, b| a.page.cmp(&b.page));
    assert_eq!(seen, fixture()[..2].to_vec(), "rows written mid-scroll are neither skipped into nor duplicated");

    let fresh = store.scroll("ns1", 10, None).await.unwrap();
    assert_eq!(fresh.chunks.len(), 4, "a new scroll sees the latest version");
}

#[tokio::test]
async fn lance_store_rejects_wrong_dimension() {
    let tmp = TempDir::new().unwrap();
    let store = LanceVectorStore::open(tmp.path(), "docs", DIM).await.unwrap();
    let bad = VectorPoint { chunk: Chunk::new("x", "ns1", "x.txt", None), vector: vec![0.5; 3] };
    assert!(store.upsert(&[bad]).await.is_err());
}
