//! docchat-text
//!
//! Keyword retrieval for the hybrid engine: an Okapi BM25 scorer, the
//! scroll-and-score lexical adapter and a persistent tantivy inverted index
//! keyed by namespace.
pub mod bm25;
pub mod index;
pub mod scroll;
pub mod tantivy_utils;

pub use bm25::{Bm25Okapi, Bm25Params};
pub use index::TantivyLexicalIndex;
pub use scroll::ScrollBm25Index;
