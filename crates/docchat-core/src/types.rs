//! Domain types shared by the retrieval, indexing and chat crates.

use serde::{Deserialize, Serialize};
use std::fmt;

pub type ChunkId = String;

/// Number of leading characters of chunk text that take part in the
/// text-prefix identity key.
pub const KEY_PREFIX_CHARS: usize = 120;

/// A bounded unit of source-document text plus its retrieval metadata.
///
/// - `id`: content hash over namespace, filename, page and text (see [`Chunk::new`])
/// - `namespace`: tenant/collection key; a chunk belongs to exactly one
/// - `filename`: basename of the uploaded file
/// - `page`: 1-based page for paginated sources (PDF)
/// - `section`: heading label, when known
/// - `source`: original path of the file the chunk came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    pub namespace: String,
    pub filename: String,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

impl Chunk {
    /// Build a chunk and derive its stable id from its content.
    pub fn new(text: impl Into<String>, namespace: impl Into<String>, filename: impl Into<String>, page: Option<u32>) -> Self {
        let text = text.into();
        let namespace = namespace.into();
        let filename = filename.into();
        let id = content_id(&namespace, &filename, page, &text);
        Self { id, text, namespace, filename, page, section: None, source: None }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self { self.source = Some(source.into()); self }

    pub fn with_section(mut self, section: impl Into<String>) -> Self { self.section = Some(section.into()); self }
}

/// blake3 over the identifying fields, hex encoded. Fields are separated by a
/// NUL byte so that ("ab", "c") and ("a", "bc") hash differently.
pub fn content_id(namespace: &str, filename: &str, page: Option<u32>, text: &str) -> ChunkId {
    let mut hasher = blake3::Hasher::new();
    hasher.update(namespace.as_bytes());
    hasher.update(&[0]);
    hasher.update(filename.as_bytes());
    hasher.update(&[0]);
    if let Some(p) = page { hasher.update(&p.to_le_bytes()); }
    hasher.update(&[0]);
    hasher.update(text.as_bytes());
    hasher.finalize().to_hex().to_string()
}

/// Which retrieval path produced a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Dense,
    Lexical,
}

/// A chunk with the raw score of one retrieval path. Higher is better, but
/// dense and lexical scores live on different scales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub chunk: Chunk,
    pub score: f32,
}

impl ScoredResult {
    pub fn new(chunk: Chunk, score: f32) -> Self { Self { chunk, score } }
}

/// Identity of a fusion candidate. Two results are the same candidate iff
/// their keys are equal.
///
/// The derived ordering is the deterministic tie-break for equal fused
/// scores: filename, then page (`None` first), then text prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChunkKey {
    TextPrefix { filename: String, page: Option<u32>, prefix: String },
    Id(ChunkId),
}

impl ChunkKey {
    pub fn text_prefix(chunk: &Chunk) -> Self {
        Self::TextPrefix {
            filename: chunk.filename.clone(),
            page: chunk.page,
            prefix: chunk.text.chars().take(KEY_PREFIX_CHARS).collect(),
        }
    }

    pub fn id(chunk: &Chunk) -> Self { Self::Id(chunk.id.clone()) }
}

/// Strategy used to derive a [`ChunkKey`] from a chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityStrategy {
    /// `(filename, page, first 120 characters of text)`.
    #[default]
    TextPrefix,
    /// The content-hash id assigned at ingest.
    ChunkId,
}

impl IdentityStrategy {
    pub fn key(self, chunk: &Chunk) -> ChunkKey {
        match self {
            Self::TextPrefix => ChunkKey::text_prefix(chunk),
            Self::ChunkId => ChunkKey::id(chunk),
        }
    }
}

/// A point for the vector store: the chunk payload and its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorPoint {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// Position in a paginated scroll over a namespace.
///
/// `snapshot` pins the store version the first page was read from, so later
/// pages see the same rows even when writes land in between. Stores without
/// versions leave it `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollCursor {
    pub offset: u64,
    pub snapshot: Option<u64>,
}

impl ScrollCursor {
    pub fn at(offset: u64) -> Self { Self { offset, snapshot: None } }

    pub fn pinned(offset: u64, snapshot: u64) -> Self { Self { offset, snapshot: Some(snapshot) } }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrollPage {
    pub chunks: Vec<Chunk>,
    pub next_cursor: Option<ScrollCursor>,
}

/// What the answer-generation flow consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextItem {
    pub text: String,
    pub filename: String,
    pub page: Option<u32>,
}

impl From<&Chunk> for ContextItem {
    fn from(chunk: &Chunk) -> Self {
        Self { text: chunk.text.clone(), filename: chunk.filename.clone(), page: chunk.page }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self { Self::User => "User", Self::Assistant => "Assistant" })
    }
}

/// One conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self { Self { role: Role::User, text: text.into() } }

    pub fn assistant(text: impl Into<String>) -> Self { Self { role: Role::Assistant, text: text.into() } }
}
