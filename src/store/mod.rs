mod appwrite;
mod error;
mod memory;

use async_trait::async_trait;

use crate::model::{Document, DocumentPatch};
pub use appwrite::AppwriteStore;
pub use error::StoreError;
pub use memory::MemoryDocumentStore;

/// Remote collection of to-do documents.
#[async_trait]
pub trait DocumentStore: Sync + Send + 'static {
    /// All documents of the collection, in no particular order.
    async fn list(&self) -> Result<Vec<Document>, StoreError>;
    /// Creates a document; the store picks its id.
    async fn create(&self, title: &str, completed: bool) -> Result<Document, StoreError>;
    async fn update(&self, id: &str, patch: &DocumentPatch) -> Result<Document, StoreError>;
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}
