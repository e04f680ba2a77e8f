use serde_derive::{Deserialize, Serialize};
use std::fmt;

use super::error::ModelError;

/// Longest document id the remote store accepts.
const MAX_DOCUMENT_ID_LEN: usize = 36;

/// Identity of a task held in local state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskId {
    /// Document id assigned by the remote store.
    Remote(String),
    /// Placeholder for an optimistic create that the store has not confirmed yet.
    Provisional(u64),
}

impl TaskId {
    pub fn remote(&self) -> Option<&str> {
        match self {
            TaskId::Remote(id) => Some(id.as_str()),
            TaskId::Provisional(_) => None,
        }
    }

    pub fn is_provisional(&self) -> bool {
        matches!(self, TaskId::Provisional(_))
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskId::Remote(id) => write!(f, "{}", id),
            TaskId::Provisional(key) => write!(f, "~{}", key),
        }
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        TaskId::Remote(id.to_string())
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        TaskId::Remote(id)
    }
}

/// Task is the single entity of the to-do list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub completed: bool,
}

impl Task {
    #[allow(dead_code)]
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>, completed: bool) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            completed,
        }
    }

    /// Local entry shown while the create call is in flight.
    pub fn provisional(key: u64, title: String) -> Self {
        Self {
            id: TaskId::Provisional(key),
            title,
            completed: false,
        }
    }

    pub fn is_provisional(&self) -> bool {
        self.id.is_provisional()
    }
}

impl From<Document> for Task {
    fn from(doc: Document) -> Self {
        Self {
            id: TaskId::Remote(doc.id),
            title: doc.title,
            completed: doc.completed,
        }
    }
}

/// A task as persisted by the remote store. Server metadata other than the
/// id is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Document {
    #[serde(rename = "$id")]
    pub id: String,
    pub title: String,
    #[serde(rename = "isCompleted", default)]
    pub completed: bool,
}

/// Partial update of a document. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DocumentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "isCompleted", skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl DocumentPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            completed: None,
        }
    }

    pub fn completed(completed: bool) -> Self {
        Self {
            title: None,
            completed: Some(completed),
        }
    }

    pub fn apply(&self, doc: &mut Document) {
        if let Some(title) = &self.title {
            doc.title = title.clone();
        }
        if let Some(completed) = self.completed {
            doc.completed = completed;
        }
    }
}

/// Trims a user supplied title, refusing blank ones.
pub fn normalize_title(raw: &str) -> Result<String, ModelError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(ModelError::EmptyTitle);
    }
    Ok(title.to_string())
}

/// Document ids end up in request paths, so only the characters the store
/// itself generates are let through.
pub fn validate_document_id(id: &str) -> Result<(), ModelError> {
    let mut chars = id.chars();
    let first_ok = matches!(chars.next(), Some(c) if c.is_ascii_alphanumeric());
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_');
    if !first_ok || !rest_ok || id.len() > MAX_DOCUMENT_ID_LEN {
        return Err(ModelError::InvalidDocumentId(id.to_string()));
    }
    Ok(())
}
