//! Per-identity document stores backing the remote intent store.

use crate::error::IntentStoreError;
use async_trait::async_trait;
use log::debug;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A versioned document of top-level fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Revision bumped on every successful write.
    pub revision: u64,
    /// Top-level fields. Only the pending-search fields are ours.
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// Guard for a partial update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// Apply unconditionally.
    None,
    /// Apply only if the document is still at this revision.
    Revision(u64),
}

#[async_trait]
/// Networked store of per-identity documents.
pub trait DocumentStore: Send + Sync {
    /// Fetch a document, `None` if it does not exist.
    async fn fetch(&self, id: &str) -> Result<Option<Document>, IntentStoreError>;

    /// Set the given top-level fields, leaving siblings untouched.
    ///
    /// Returns the new revision. A failed precondition yields
    /// [`IntentStoreError::Conflict`].
    async fn merge(
        &self,
        id: &str,
        fields: Map<String, Value>,
        precondition: Precondition,
    ) -> Result<u64, IntentStoreError>;
}

/// In-process document store.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: Mutex<HashMap<String, Document>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a document, for inspection.
    pub fn document(&self, id: &str) -> Option<Document> {
        self.documents.lock().get(id).cloned()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn fetch(&self, id: &str) -> Result<Option<Document>, IntentStoreError> {
        Ok(self.document(id))
    }

    async fn merge(
        &self,
        id: &str,
        fields: Map<String, Value>,
        precondition: Precondition,
    ) -> Result<u64, IntentStoreError> {
        let mut documents = self.documents.lock();
        let current = documents.get(id).map_or(0, |document| document.revision);
        if let Precondition::Revision(expected) = precondition
            && current != expected
        {
            debug!("rejected conditional merge (id={id}, expected={expected}, actual={current})");
            return Err(IntentStoreError::Conflict(id.to_string()));
        }
        let document = documents.entry(id.to_string()).or_default();
        document.fields.extend(fields);
        document.revision += 1;
        Ok(document.revision)
    }
}
