//! Pending-search store over per-identity remote documents.

use crate::backend::{BackendKind, Consumption, IntentBackend, checked_storage_key};
use crate::document::{DocumentStore, Precondition};
use crate::error::IntentStoreError;
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use pharmyrus_rs_protocol::{IdentityKey, IntentRecord};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Field recording the last successful resume. Written, never read back.
pub const LAST_RESUMED_AT_FIELD: &str = "lastResumedAt";

/// Default document field holding the pending search.
pub const DEFAULT_PENDING_FIELD: &str = "pendingSearch";

/// Remote store writing the pending search into one field of a larger document.
///
/// Only the pending field and [`LAST_RESUMED_AT_FIELD`] are ever written;
/// every other field of the document is preserved.
///
/// Captures always happen before login, so the capture flow writes to
/// `session-<uuid>` documents only. A `user-<id>` document is read at resume
/// but written only by hosts that save under a user key themselves. Consumed
/// session documents keep their nulled field and resume stamp; expiring them
/// is left to the document service.
#[derive(Clone)]
pub struct RemoteIntentStore {
    documents: Arc<dyn DocumentStore>,
    field: String,
    max_conflict_retries: u32,
}

impl RemoteIntentStore {
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self {
            documents,
            field: DEFAULT_PENDING_FIELD.to_string(),
            max_conflict_retries: 3,
        }
    }

    /// Use a different document field for the pending search.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    /// Bound re-reads after a conditional write loses to another writer.
    pub fn with_max_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }

    fn pending_from(
        &self,
        fields: &Map<String, Value>,
    ) -> Result<Option<IntentRecord>, IntentStoreError> {
        match fields.get(&self.field) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
        }
    }

    fn single_field(&self, value: Value) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert(self.field.clone(), value);
        fields
    }
}

#[async_trait]
impl IntentBackend for RemoteIntentStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    async fn save(
        &self,
        key: &IdentityKey,
        record: IntentRecord,
    ) -> Result<IntentRecord, IntentStoreError> {
        let id = checked_storage_key(key)?;
        let record = record.stamped(Utc::now());
        let fields = self.single_field(serde_json::to_value(&record)?);
        let revision = self.documents.merge(&id, fields, Precondition::None).await?;
        debug!(
            "saved pending search to document (id={id}, field={}, revision={revision})",
            self.field
        );
        Ok(record)
    }

    async fn load(&self, key: &IdentityKey) -> Result<Option<IntentRecord>, IntentStoreError> {
        let id = checked_storage_key(key)?;
        match self.documents.fetch(&id).await? {
            Some(document) => self.pending_from(&document.fields),
            None => Ok(None),
        }
    }

    async fn clear(&self, key: &IdentityKey) -> Result<bool, IntentStoreError> {
        let id = checked_storage_key(key)?;
        let Some(document) = self.documents.fetch(&id).await? else {
            return Ok(false);
        };
        if matches!(document.fields.get(&self.field), None | Some(Value::Null)) {
            return Ok(false);
        }
        self.documents
            .merge(&id, self.single_field(Value::Null), Precondition::None)
            .await?;
        Ok(true)
    }

    async fn consume(&self, key: &IdentityKey) -> Result<Consumption, IntentStoreError> {
        let id = checked_storage_key(key)?;
        for attempt in 0..=self.max_conflict_retries {
            let Some(document) = self.documents.fetch(&id).await? else {
                return Ok(Consumption::Absent);
            };
            let Some(record) = self.pending_from(&document.fields)? else {
                return Ok(if attempt == 0 {
                    Consumption::Absent
                } else {
                    Consumption::AlreadyConsumed
                });
            };

            let mut fields = self.single_field(Value::Null);
            fields.insert(
                LAST_RESUMED_AT_FIELD.to_string(),
                Value::String(Utc::now().to_rfc3339()),
            );
            match self
                .documents
                .merge(&id, fields, Precondition::Revision(document.revision))
                .await
            {
                Ok(revision) => {
                    info!("consumed pending search from document (id={id}, revision={revision})");
                    return Ok(Consumption::Consumed(record));
                }
                Err(IntentStoreError::Conflict(_)) => {
                    debug!("document changed during consume (id={id}, attempt={attempt})");
                }
                Err(err) => return Err(err),
            }
        }
        warn!(
            "giving up consume after repeated conflicts (id={id}, retries={})",
            self.max_conflict_retries
        );
        Err(IntentStoreError::Conflict(id))
    }
}

#[cfg(test)]
mod tests {
    use super::{LAST_RESUMED_AT_FIELD, RemoteIntentStore};
    use crate::backend::{Consumption, IntentBackend};
    use crate::document::{DocumentStore, MemoryDocumentStore, Precondition};
    use pharmyrus_rs_protocol::{IdentityKey, IntentRecord, RegionScope, SearchForm, UserId};
    use pretty_assertions::assert_eq;
    use serde_json::{Map, Value, json};
    use std::sync::Arc;

    fn record(primary: &str) -> IntentRecord {
        IntentRecord::new(
            SearchForm::new(primary, "Nubeqa", ["BR", "US"])
                .validate(&RegionScope::default())
                .expect("params"),
        )
    }

    fn user_key() -> IdentityKey {
        IdentityKey::User(UserId::new("u1"))
    }

    async fn seed_sibling(documents: &MemoryDocumentStore) {
        let mut fields = Map::new();
        fields.insert("displayName".to_string(), json!("Ana"));
        documents
            .merge("user-u1", fields, Precondition::None)
            .await
            .expect("seed");
    }

    #[tokio::test]
    async fn save_merges_without_touching_siblings() {
        let documents = Arc::new(MemoryDocumentStore::new());
        seed_sibling(&documents).await;
        let store = RemoteIntentStore::new(documents.clone());

        store.save(&user_key(), record("darolutamide")).await.expect("save");

        let document = documents.document("user-u1").expect("doc");
        assert_eq!(document.fields["displayName"], json!("Ana"));
        assert_eq!(
            document.fields["pendingSearch"]["primaryTerm"],
            json!("darolutamide")
        );
        assert_eq!(
            document.fields["pendingSearch"]["scope"],
            json!(["BR", "US"])
        );
    }

    #[tokio::test]
    async fn consume_nulls_field_and_stamps_resume_time() {
        let documents = Arc::new(MemoryDocumentStore::new());
        seed_sibling(&documents).await;
        let store = RemoteIntentStore::new(documents.clone()).with_field("pending");

        store.save(&user_key(), record("darolutamide")).await.expect("save");
        let consumed = store.consume(&user_key()).await.expect("consume");
        let Consumption::Consumed(taken) = consumed else {
            panic!("expected consumed, got {consumed:?}");
        };
        assert_eq!(taken.params.primary_term, "darolutamide");

        let document = documents.document("user-u1").expect("doc");
        assert_eq!(document.fields["pending"], Value::Null);
        assert!(document.fields[LAST_RESUMED_AT_FIELD].is_string());
        assert_eq!(document.fields["displayName"], json!("Ana"));

        assert_eq!(
            store.consume(&user_key()).await.expect("again"),
            Consumption::Absent
        );
        assert_eq!(store.load(&user_key()).await.expect("load"), None);
    }

    #[tokio::test]
    async fn clear_is_noop_without_pending_field() {
        let documents = Arc::new(MemoryDocumentStore::new());
        let store = RemoteIntentStore::new(documents.clone());
        assert!(!store.clear(&user_key()).await.expect("missing doc"));
        seed_sibling(&documents).await;
        assert!(!store.clear(&user_key()).await.expect("no field"));
        store.save(&user_key(), record("x")).await.expect("save");
        assert!(store.clear(&user_key()).await.expect("clear"));
    }

    #[tokio::test]
    async fn concurrent_consumers_take_record_once() {
        let documents = Arc::new(MemoryDocumentStore::new());
        let store = Arc::new(RemoteIntentStore::new(documents));
        store.save(&user_key(), record("x")).await.expect("save");

        let tasks = (0..8).map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.consume(&user_key()).await })
        });
        let results = futures_util::future::join_all(tasks).await;
        let consumed = results
            .into_iter()
            .map(|joined| joined.expect("join").expect("consume"))
            .filter(|outcome| matches!(outcome, Consumption::Consumed(_)))
            .count();
        assert_eq!(consumed, 1);
    }
}
