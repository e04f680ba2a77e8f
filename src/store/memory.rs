use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use super::{DocumentStore, StoreError};
use crate::model::{Document, DocumentPatch};

/// In-process collection. Keeps insertion order so listings are stable.
pub struct MemoryDocumentStore {
    documents: Mutex<Vec<Document>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::with_documents(Vec::new())
    }

    pub fn with_documents(documents: Vec<Document>) -> Self {
        Self {
            documents: Mutex::new(documents),
        }
    }

    #[allow(dead_code)]
    pub fn documents(&self) -> Vec<Document> {
        self.documents.lock().clone()
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn list(&self) -> Result<Vec<Document>, StoreError> {
        Ok(self.documents.lock().clone())
    }

    async fn create(&self, title: &str, completed: bool) -> Result<Document, StoreError> {
        let doc = Document {
            id: Uuid::new_v4().simple().to_string()[..20].to_string(),
            title: title.to_string(),
            completed,
        };
        self.documents.lock().push(doc.clone());
        Ok(doc)
    }

    async fn update(&self, id: &str, patch: &DocumentPatch) -> Result<Document, StoreError> {
        let mut documents = self.documents.lock();
        let doc = documents
            .iter_mut()
            .find(|doc| doc.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        patch.apply(doc);
        Ok(doc.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut documents = self.documents.lock();
        let idx = documents
            .iter()
            .position(|doc| doc.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        documents.remove(idx);
        Ok(())
    }
}
