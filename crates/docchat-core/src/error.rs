use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The vector or lexical backing store could not be reached.
    #[error("Retrieval unavailable: {0}")]
    RetrievalUnavailable(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFile(String),

    #[error("Operation failed: {0}")]
    Operation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn retrieval<E: std::fmt::Display>(err: E) -> Self { Self::RetrievalUnavailable(err.to_string()) }

    pub fn operation<E: std::fmt::Display>(err: E) -> Self { Self::Operation(err.to_string()) }
}

pub type Result<T> = std::result::Result<T, Error>;
