//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge built-in defaults, `config.toml`, `config.<env>.toml`
//! and `APP_*` env vars (`__` separates nested keys, so `APP_SERVER__PORT`
//! sets `server.port`). Provides helpers to expand `~` and `${VAR}` and to
//! resolve relative paths against a known base directory.
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::ingest::ChunkingConfig;
use crate::types::IdentityStrategy;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name)
    }

    pub fn load_for_env(env_name: &str) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?.validate()?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Self { Self { figment } }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{key}': {e}")))
    }

    pub fn settings(&self) -> Result<Settings> {
        self.figment.extract().map_err(|e| Error::InvalidConfig(e.to_string()))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub data: DataSettings,
    pub embedding: EmbeddingSettings,
    pub generation: GenerationSettings,
    pub retrieval: RetrievalSettings,
    pub chunking: ChunkingConfig,
    pub history: HistorySettings,
    pub logging: LoggingSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let r = &self.retrieval;
        if !(0.0..=1.0).contains(&r.default_alpha) {
            return Err(Error::InvalidConfig(format!("retrieval.default_alpha must be within [0, 1], got {}", r.default_alpha)));
        }
        if r.candidate_floor == 0 || r.scroll_page_size == 0 || r.default_top_k == 0 {
            return Err(Error::InvalidConfig("retrieval.candidate_floor, scroll_page_size and default_top_k must be positive".into()));
        }
        if self.chunking.overlap_words >= self.chunking.max_words {
            return Err(Error::InvalidConfig(format!(
                "chunking.overlap_words ({}) must be smaller than chunking.max_words ({})",
                self.chunking.overlap_words, self.chunking.max_words
            )));
        }
        if self.embedding.dim == 0 || self.embedding.batch_size == 0 {
            return Err(Error::InvalidConfig("embedding.dim and embedding.batch_size must be positive".into()));
        }
        if self.history.capacity == 0 {
            return Err(Error::InvalidConfig("history.capacity must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors: bool,
}

impl Default for ServerSettings {
    fn default() -> Self { Self { host: "127.0.0.1".to_string(), port: 8000, cors: true } }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub uploads_dir: String,
    pub lancedb_dir: String,
    pub tantivy_dir: String,
    /// Vector table name.
    pub collection: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            uploads_dir: "data/uploads".to_string(),
            lancedb_dir: "data/indexes/lancedb".to_string(),
            tantivy_dir: "data/indexes/tantivy".to_string(),
            collection: "docs".to_string(),
        }
    }
}

impl DataSettings {
    pub fn uploads_path(&self, base: &Path) -> PathBuf { resolve_with_base(base, &self.uploads_dir) }

    pub fn lancedb_path(&self, base: &Path) -> PathBuf { resolve_with_base(base, &self.lancedb_dir) }

    pub fn tantivy_path(&self, base: &Path) -> PathBuf { resolve_with_base(base, &self.tantivy_dir) }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    #[default]
    Gemini,
    /// Deterministic hashed vectors, no network.
    Fake,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dim: usize,
    pub base_url: String,
    pub api_key: Option<String>,
    pub batch_size: usize,
    pub max_attempts: u32,
    pub timeout_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Gemini,
            model: "text-embedding-004".to_string(),
            dim: 768,
            base_url: GEMINI_BASE_URL.to_string(),
            api_key: None,
            batch_size: 32,
            max_attempts: 5,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self { model: "gemini-2.5-flash".to_string(), base_url: GEMINI_BASE_URL.to_string(), api_key: None, timeout_secs: 60 }
    }
}

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LexicalBackend {
    /// Persistent inverted index updated at ingest.
    #[default]
    Tantivy,
    /// BM25 rebuilt per query from a full scroll of the namespace.
    Scroll,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub lexical: LexicalBackend,
    /// Minimum number of candidates requested from each retrieval path.
    pub candidate_floor: usize,
    pub scroll_page_size: usize,
    pub default_alpha: f32,
    pub default_top_k: usize,
    pub identity: IdentityStrategy,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            lexical: LexicalBackend::Tantivy,
            candidate_floor: 20,
            scroll_page_size: 256,
            default_alpha: 0.6,
            default_top_k: 4,
            identity: IdentityStrategy::TextPrefix,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    pub capacity: usize,
    pub recent_turns: usize,
}

impl Default for HistorySettings {
    fn default() -> Self { Self { capacity: 10, recent_turns: 5 } }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self { Self { level: "info".to_string(), format: LogFormat::Text } }
}

/// The configured key, else `GOOGLE_API_KEY`, else `GEMINI_API_KEY`.
pub fn resolve_api_key(configured: Option<&str>) -> Option<String> {
    configured
        .filter(|k| !k.trim().is_empty())
        .map(str::to_string)
        .or_else(|| env::var("GOOGLE_API_KEY").ok())
        .or_else(|| env::var("GEMINI_API_KEY").ok())
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
