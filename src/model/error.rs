use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("task title must not be empty")]
    EmptyTitle,
    #[error("invalid document id: {0:?}")]
    InvalidDocumentId(String),
}
