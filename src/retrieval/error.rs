use std::io;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("document content is empty")]
    EmptyDocument,
    #[error("document {0} not found")]
    NotFound(String),
    #[error("retrieval backend error: {0}")]
    Backend(String),
}
