//! Embedding providers: the Gemini HTTP client and a deterministic offline
//! embedder for tests and local runs.
use std::sync::Arc;
use tracing::info;

use docchat_core::config::{EmbeddingProvider, EmbeddingSettings};
use docchat_core::error::Result;
use docchat_core::traits::Embedder;

pub mod fake;
pub mod gemini;
pub mod retry;

pub use fake::FakeEmbedder;
pub use gemini::GeminiEmbedder;
pub use retry::RetryPolicy;

/// Build the embedder selected by `settings.provider`.
pub fn embedder_from_settings(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    match settings.provider {
        EmbeddingProvider::Fake => {
            info!("Using FakeEmbedder (dim {})", settings.dim);
            Ok(Arc::new(FakeEmbedder::new(settings.dim)))
        }
        EmbeddingProvider::Gemini => Ok(Arc::new(GeminiEmbedder::from_settings(settings)?)),
    }
}
