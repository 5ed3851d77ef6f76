use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::backend::RetrievalBackend;
use super::document::RetrievalDocument;
use super::error::StoreError;

/// Length of the short id shown in listings.
pub const SHORT_ID_LEN: usize = 8;

/// The knowledge base prompts are augmented from.
///
/// Thin capability wrapper over a [`RetrievalBackend`]; errors are surfaced
/// and never retried, except by [`KnowledgeBase::query`] which degrades to no
/// context instead of failing.
#[derive(Clone)]
pub struct KnowledgeBase {
    backend: Arc<dyn RetrievalBackend>,
}

impl KnowledgeBase {
    pub fn new(backend: Arc<dyn RetrievalBackend>) -> Self {
        Self { backend }
    }

    /// Stores `content` under a fresh id and returns it.
    pub async fn add(
        &self,
        content: &str,
        mut metadata: BTreeMap<String, String>,
    ) -> Result<String, StoreError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(StoreError::EmptyDocument);
        }
        metadata
            .entry("created_at".to_string())
            .or_insert_with(|| Utc::now().to_rfc3339());
        let id = Uuid::new_v4().to_string();
        self.backend
            .add(RetrievalDocument {
                id: id.clone(),
                content: content.to_string(),
                metadata,
            })
            .await?;
        log::info!("added knowledge document {id}");
        Ok(id)
    }

    /// Contents of the `k` best matches for `text`, best first.
    ///
    /// Returns an empty list when nothing is stored or the backend fails.
    pub async fn query(&self, text: &str, k: usize) -> Vec<String> {
        match self.backend.query(text, k).await {
            Ok(documents) => documents
                .into_iter()
                .take(k)
                .map(|doc| doc.content)
                .collect(),
            Err(err) => {
                log::warn!("retrieval failed, continuing without context: {err}");
                Vec::new()
            }
        }
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.backend.delete(id).await
    }

    /// `(id, content)` pairs in insertion order.
    pub async fn list(&self) -> Result<Vec<(String, String)>, StoreError> {
        Ok(self
            .backend
            .get_all()
            .await?
            .into_iter()
            .map(|doc| (doc.id, doc.content))
            .collect())
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        self.backend.reset().await
    }

    /// Finds the full id of the first document whose id starts with `prefix`.
    pub async fn resolve_prefix(&self, prefix: &str) -> Result<String, StoreError> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Err(StoreError::NotFound(String::new()));
        }
        self.backend
            .get_all()
            .await?
            .into_iter()
            .map(|doc| doc.id)
            .find(|id| id.starts_with(prefix))
            .ok_or_else(|| StoreError::NotFound(prefix.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::retrieval::LocalIndex;

    struct BrokenBackend;

    #[async_trait]
    impl RetrievalBackend for BrokenBackend {
        async fn add(&self, _document: RetrievalDocument) -> Result<(), StoreError> {
            Err(StoreError::Backend("offline".into()))
        }
        async fn query(&self, _text: &str, _k: usize) -> Result<Vec<RetrievalDocument>, StoreError> {
            Err(StoreError::Backend("offline".into()))
        }
        async fn get_all(&self) -> Result<Vec<RetrievalDocument>, StoreError> {
            Err(StoreError::Backend("offline".into()))
        }
        async fn delete(&self, _id: &str) -> Result<(), StoreError> {
            Err(StoreError::Backend("offline".into()))
        }
        async fn reset(&self) -> Result<(), StoreError> {
            Err(StoreError::Backend("offline".into()))
        }
    }

    async fn local() -> (tempfile::TempDir, KnowledgeBase) {
        let dir = tempfile::tempdir().unwrap();
        let index = LocalIndex::open(dir.path(), "rag_knowledge").await.unwrap();
        (dir, KnowledgeBase::new(Arc::new(index)))
    }

    #[tokio::test]
    async fn empty_store_query_is_empty() {
        let (_dir, kb) = local().await;
        assert!(kb.query("x", 3).await.is_empty());
    }

    #[tokio::test]
    async fn failing_backend_query_degrades_to_empty() {
        let kb = KnowledgeBase::new(Arc::new(BrokenBackend));
        assert!(kb.query("x", 3).await.is_empty());
        assert!(matches!(
            kb.add("doc", BTreeMap::new()).await,
            Err(StoreError::Backend(_))
        ));
        assert!(kb.list().await.is_err());
    }

    #[tokio::test]
    async fn add_list_delete_clear() {
        let (_dir, kb) = local().await;
        let first = kb.add("  Paris is the capital of France ", BTreeMap::new()).await.unwrap();
        let second = kb.add("Ankara is the capital of Turkey", BTreeMap::new()).await.unwrap();
        assert_ne!(first, second);

        let list = kb.list().await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0], (first.clone(), "Paris is the capital of France".to_string()));

        let hits = kb.query("capital of Turkey", 1).await;
        assert_eq!(hits, vec!["Ankara is the capital of Turkey".to_string()]);

        kb.delete(&first).await.unwrap();
        assert_eq!(kb.list().await.unwrap().len(), 1);

        kb.clear().await.unwrap();
        assert!(kb.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_stamps_metadata_and_rejects_empty() {
        let (_dir, kb) = local().await;
        assert!(matches!(kb.add("   ", BTreeMap::new()).await, Err(StoreError::EmptyDocument)));

        let mut metadata = BTreeMap::new();
        metadata.insert("source".to_string(), "manual".to_string());
        kb.add("note", metadata).await.unwrap();
        let docs = kb.backend.get_all().await.unwrap();
        assert_eq!(docs[0].metadata["source"], "manual");
        assert!(docs[0].metadata.contains_key("created_at"));
    }

    #[tokio::test]
    async fn resolves_short_ids() {
        let (_dir, kb) = local().await;
        let id = kb.add("remember me", BTreeMap::new()).await.unwrap();
        let short = &id[..SHORT_ID_LEN];
        assert_eq!(kb.resolve_prefix(short).await.unwrap(), id);
        assert!(matches!(
            kb.resolve_prefix("zzzzzzzz").await,
            Err(StoreError::NotFound(_))
        ));
        assert!(kb.resolve_prefix("").await.is_err());
    }
}
