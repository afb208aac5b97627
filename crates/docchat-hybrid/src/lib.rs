//! Hybrid retrieval: min/max score normalization, weighted fusion of dense and
//! lexical results, the retrieval orchestrator and the namespace indexer.
pub mod fusion;
pub mod indexer;
pub mod normalize;
pub mod retriever;

pub use fusion::{fuse, FusedResult};
pub use indexer::{namespace_dir, IndexSummary, NamespaceIndexer};
pub use normalize::{normalize, NormalizedResult};
pub use retriever::{HybridRetriever, IndexCounts};
