use async_trait::async_trait;

use super::document::RetrievalDocument;
use super::error::StoreError;

/// A similarity-search document collection.
///
/// How documents are indexed and ranked is up to the implementation; callers
/// only rely on `query` returning at most `k` documents, best match first.
#[async_trait]
pub trait RetrievalBackend: Send + Sync {
    async fn add(&self, document: RetrievalDocument) -> Result<(), StoreError>;

    async fn query(&self, text: &str, k: usize) -> Result<Vec<RetrievalDocument>, StoreError>;

    /// All documents in insertion order.
    async fn get_all(&self) -> Result<Vec<RetrievalDocument>, StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Drops the collection and recreates it empty.
    async fn reset(&self) -> Result<(), StoreError>;
}
