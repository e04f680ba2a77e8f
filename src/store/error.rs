use thiserror::*;

use crate::model::ModelError;

/// Every way a remote store call can fail. Callers treat them all as
/// "remote operation failed"; the variants only feed diagnostics.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request to remote store failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("remote store returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("the document not found {0}")]
    NotFound(String),

    #[error("invalid store configuration: {0}")]
    Configuration(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}
