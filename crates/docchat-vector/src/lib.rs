//! Dense retrieval: the namespace-scoped vector adapter and its stores.
pub mod dense;
pub mod memory;
pub mod schema;
pub mod store;
pub mod table;

pub use dense::DenseRetriever;
pub use memory::MemoryVectorStore;
pub use store::LanceVectorStore;
