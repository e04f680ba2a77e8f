pub mod error;
pub mod task;

pub use error::ModelError;
pub use task::{normalize_title, validate_document_id, Document, DocumentPatch, Task, TaskId};
