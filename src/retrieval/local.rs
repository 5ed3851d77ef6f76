use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::backend::RetrievalBackend;
use super::document::RetrievalDocument;
use super::embedding::{cosine, embed};
use super::error::StoreError;

struct IndexedDocument {
    document: RetrievalDocument,
    vector: Vec<f32>,
}

impl IndexedDocument {
    fn new(document: RetrievalDocument) -> Self {
        let vector = embed(&document.content);
        Self { document, vector }
    }
}

/// In-process collection persisted as one JSON file.
///
/// Vectors are rebuilt from content on open and never written to disk.
pub struct LocalIndex {
    path: PathBuf,
    documents: RwLock<Vec<IndexedDocument>>,
}

impl LocalIndex {
    /// Opens `<dir>/<collection>.json`, creating an empty collection if absent.
    pub async fn open(dir: &Path, collection: &str) -> Result<Self, StoreError> {
        let path = dir.join(format!("{collection}.json"));
        let documents = match tokio::fs::read(&path).await {
            Ok(data) => serde_json::from_slice::<Vec<RetrievalDocument>>(&data)?
                .into_iter()
                .map(IndexedDocument::new)
                .collect(),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(err.into()),
        };
        log::debug!("opened collection {} with {} documents", path.display(), documents.len());
        Ok(Self {
            path,
            documents: RwLock::new(documents),
        })
    }

    async fn persist(&self, documents: &[IndexedDocument]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let plain: Vec<&RetrievalDocument> = documents.iter().map(|d| &d.document).collect();
        let payload = serde_json::to_vec_pretty(&plain)?;
        tokio::fs::write(&self.path, payload).await?;
        Ok(())
    }
}

#[async_trait]
impl RetrievalBackend for LocalIndex {
    async fn add(&self, document: RetrievalDocument) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;
        documents.push(IndexedDocument::new(document));
        if let Err(err) = self.persist(&documents).await {
            documents.pop();
            return Err(err);
        }
        Ok(())
    }

    async fn query(&self, text: &str, k: usize) -> Result<Vec<RetrievalDocument>, StoreError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let query = embed(text);
        let documents = self.documents.read().await;
        let mut scored: Vec<(f32, &IndexedDocument)> = documents
            .iter()
            .map(|doc| (cosine(&query, &doc.vector), doc))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored
            .into_iter()
            .take(k)
            .map(|(_, doc)| doc.document.clone())
            .collect())
    }

    async fn get_all(&self) -> Result<Vec<RetrievalDocument>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents.iter().map(|d| d.document.clone()).collect())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;
        let Some(pos) = documents.iter().position(|d| d.document.id == id) else {
            return Err(StoreError::NotFound(id.to_string()));
        };
        let removed = documents.remove(pos);
        if let Err(err) = self.persist(&documents).await {
            documents.insert(pos, removed);
            return Err(err);
        }
        Ok(())
    }

    async fn reset(&self) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        documents.clear();
        Ok(())
    }
}
