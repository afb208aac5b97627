use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use docchat_chat::{ChatService, InMemoryHistory};
use docchat_cli::http::{create_router, AppState};
use docchat_core::error::{Error, Result};
use docchat_core::ingest::DataProcessor;
use docchat_core::traits::{AnswerGenerator, Embedder, VectorStore};
use docchat_core::types::{ScoredResult, VectorPoint};
use docchat_embed::FakeEmbedder;
use docchat_hybrid::{HybridRetriever, NamespaceIndexer};
use docchat_text::TantivyLexicalIndex;
use docchat_vector::MemoryVectorStore;

struct CannedGenerator;

#[async_trait]
impl AnswerGenerator for CannedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> { Ok(format!("generated from {} chars", prompt.len())) }
}

struct DownStore;

#[async_trait]
impl VectorStore for DownStore {
    async fn upsert(&self, _: &[VectorPoint]) -> Result<()> { Err(Error::RetrievalUnavailable("connection refused".into())) }
    async fn search(&self, _: &[f32], _: &str, _: usize) -> Result<Vec<ScoredResult>> { Err(Error::RetrievalUnavailable("connection refused".into())) }
}

/// Fails with the kind of upstream text a provider error carries.
struct LeakyUpstream;

const UPSTREAM_DETAIL: &str = "quota exceeded for project 1234 key AIza-secret";

#[async_trait]
impl Embedder for LeakyUpstream {
    fn dim(&self) -> usize { 64 }
    async fn embed_batch(&self, _: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(Error::Embedding(format!("HTTP error (429): {UPSTREAM_DETAIL}")))
    }
}

#[async_trait]
impl AnswerGenerator for LeakyUpstream {
    async fn generate(&self, _: &str) -> Result<String> { Err(Error::Generation(format!("HTTP error (500): {UPSTREAM_DETAIL}"))) }
}

fn app_state(uploads: &Path, store: Arc<dyn VectorStore>) -> AppState {
    app_state_with(uploads, Arc::new(FakeEmbedder::new(64)), store, Arc::new(CannedGenerator))
}

fn app_state_with(uploads: &Path, embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>, generator: Arc<dyn AnswerGenerator>) -> AppState {
    let retriever = Arc::new(HybridRetriever::new(embedder, store, Arc::new(TantivyLexicalIndex::in_memory().unwrap())));
    let chat = ChatService::new(retriever.clone(), generator, Arc::new(InMemoryHistory::default()));
    let indexer = NamespaceIndexer::new(DataProcessor::new(), retriever.clone(), uploads.to_path_buf());
    AppState::new(retriever, Arc::new(chat), Arc::new(indexer), DataProcessor::new())
}

async fn serve(state: AppState) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, create_router(state, true)).await.ok() });
    format!("http://{addr}")
}

fn multipart_body(boundary: &str, namespace: &str, files: &[(&str, &str)]) -> String {
    let mut body = format!("--{boundary}\r\nContent-Disposition: form-data; name=\"namespace\"\r\n\r\n{namespace}\r\n");
    for (name, content) in files {
        body.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: application/octet-stream\r\n\r\n{content}\r\n"
        ));
    }
    body.push_str(&format!("--{boundary}--\r\n"));
    body
}

async fn upload(client: &reqwest::Client, base: &str, namespace: &str, files: &[(&str, &str)]) -> reqwest::Response {
    let boundary = "docchat-test-boundary";
    client
        .post(format!("{base}/upload"))
        .header("content-type", format!("multipart/form-data; boundary={boundary}"))
        .body(multipart_body(boundary, namespace, files))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let tmp = TempDir::new().unwrap();
    let base = serve(app_state(tmp.path(), Arc::new(MemoryVectorStore::new()))).await;
    let body: Value = reqwest::get(format!("{base}/health")).await.unwrap().json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn upload_index_search_and_ask() {
    let tmp = TempDir::new().unwrap();
    let base = serve(app_state(tmp.path(), Arc::new(MemoryVectorStore::new()))).await;
    let client = reqwest::Client::new();

    let long_text = format!("battery warranty {}", "details ".repeat(60));
    let resp = upload(&client, &base, "acme", &[("manual.txt", &long_text), ("hr.md", "office hours are nine to five"), ("photo.png", "x")]).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let saved: Value = resp.json().await.unwrap();
    assert_eq!(saved["count"], 2);
    let stored_name = saved["files_saved"][0]["filename"].as_str().unwrap().to_string();
    assert!(stored_name.ends_with("_manual.txt"));
    assert_eq!(stored_name.len(), "YYYYmmdd_HHMMSS_manual.txt".len());
    assert!(tmp.path().join("acme").join(&stored_name).is_file());

    let preview: Value = client
        .get(format!("{base}/ingest/preview"))
        .query(&[("namespace", "acme"), ("filename", stored_name.as_str()), ("limit", "1")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(preview["total_chunks"], 1);
    assert!(preview["preview"][0]["text"].as_str().unwrap().ends_with("..."));
    assert_eq!(preview["preview"][0]["metadata"]["filename"], stored_name.as_str());

    let summary: Value = client.post(format!("{base}/index?namespace=acme")).send().await.unwrap().json().await.unwrap();
    assert_eq!(summary, json!({"namespace": "acme", "files_indexed": 2, "chunks_processed": 2, "points_upserted": 2}));

    let search: Value = client
        .get(format!("{base}/search"))
        .query(&[("namespace", "acme"), ("q", "battery warranty"), ("k", "1")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(search["alpha"].as_f64().map(|a| (a - 0.6).abs() < 1e-6), Some(true));
    let results = search["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["filename"], stored_name.as_str());
    // lexical list has a single hit, so only the dense side contributes: 0.6 * 1.0
    assert_eq!(results[0]["score"], 0.6);
    assert!(results[0]["snippet"].as_str().unwrap().ends_with("..."));

    let ask: Value = client
        .post(format!("{base}/ask"))
        .json(&json!({"namespace": "acme", "question": "what does the battery warranty cover", "top_k": 1}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ask["mode"], "DOC_QA");
    assert_eq!(ask["citations"], json!([{"label": stored_name}]));
    assert!(ask["answer"].as_str().unwrap().starts_with("generated from"));

    let small_talk: Value = client.post(format!("{base}/ask")).json(&json!({"namespace": "acme", "question": "hello"})).send().await.unwrap().json().await.unwrap();
    assert_eq!(small_talk["mode"], "SMALL_TALK");
    assert_eq!(small_talk["citations"], json!([]));
}

#[tokio::test]
async fn invalid_requests_get_400_and_404() {
    let tmp = TempDir::new().unwrap();
    let base = serve(app_state(tmp.path(), Arc::new(MemoryVectorStore::new()))).await;
    let client = reqwest::Client::new();

    for query in [vec![("namespace", "acme"), ("q", "x")], vec![("namespace", "acme"), ("q", "ok"), ("k", "21")], vec![("namespace", "acme"), ("q", "ok"), ("alpha", "1.5")]] {
        let resp = client.get(format!("{base}/search")).query(&query).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{query:?}");
    }

    let resp = client.post(format!("{base}/ask")).json(&json!({"namespace": " ", "question": "q"})).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client.post(format!("{base}/index?namespace=%20")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = upload(&client, &base, "acme", &[("slides.pptx", "binary")]).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .get(format!("{base}/ingest/preview"))
        .query(&[("namespace", "acme"), ("filename", "missing.txt")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = client
        .get(format!("{base}/ingest/preview"))
        .query(&[("namespace", "acme"), ("filename", "../secret.txt")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn retrieval_outage_maps_to_503_with_generic_message() {
    let tmp = TempDir::new().unwrap();
    let base = serve(app_state(tmp.path(), Arc::new(DownStore))).await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/search")).query(&[("namespace", "acme"), ("q", "battery")]).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Retrieval failed, please try again.");
    assert!(!body.to_string().contains("connection refused"));

    let resp = client.post(format!("{base}/ask")).json(&json!({"namespace": "acme", "question": "what is covered"})).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn upstream_failures_never_reach_the_client() {
    let tmp = TempDir::new().unwrap();
    let client = reqwest::Client::new();

    let base = serve(app_state_with(tmp.path(), Arc::new(LeakyUpstream), Arc::new(MemoryVectorStore::new()), Arc::new(CannedGenerator))).await;
    let resp = client.get(format!("{base}/search")).query(&[("namespace", "acme"), ("q", "battery")]).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = resp.text().await.unwrap();
    assert!(!body.contains(UPSTREAM_DETAIL), "{body}");
    assert!(body.contains("Retrieval failed, please try again."));

    let resp = client.post(format!("{base}/ask")).json(&json!({"namespace": "acme", "question": "what is covered"})).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(!resp.text().await.unwrap().contains(UPSTREAM_DETAIL));

    let base = serve(app_state_with(tmp.path(), Arc::new(FakeEmbedder::new(64)), Arc::new(MemoryVectorStore::new()), Arc::new(LeakyUpstream))).await;
    let resp = client.post(format!("{base}/ask")).json(&json!({"namespace": "acme", "question": "hello there"})).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "INTERNAL_ERROR");
    assert!(!body.to_string().contains(UPSTREAM_DETAIL));
}
