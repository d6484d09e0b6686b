//! File-backed pending-search stores.

use crate::backend::{BackendKind, Consumption, IntentBackend, checked_storage_key};
use crate::error::IntentStoreError;
use crate::session::SessionCorrelator;
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use pharmyrus_rs_protocol::{IdentityKey, IntentRecord};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Local store keeping one JSON file per identity key.
///
/// Writes go through a temp file and an atomic rename. Consumption claims
/// the file by renaming it to a unique path, so at most one caller wins.
#[derive(Debug, Clone)]
pub struct LocalIntentStore {
    /// Directory holding the record files.
    root: PathBuf,
}

impl LocalIntentStore {
    /// Create a store under the given root.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, IntentStoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        info!("initialized local intent store (root={})", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, storage_key: &str) -> PathBuf {
        self.root.join(format!("{storage_key}.json"))
    }

    /// Unique sibling path for temp files and claims.
    fn scratch_path(&self, storage_key: &str, suffix: &str) -> PathBuf {
        self.root.join(format!("{storage_key}.json.{}.{suffix}", Uuid::new_v4()))
    }

    fn write_record(
        &self,
        key: &IdentityKey,
        record: &IntentRecord,
    ) -> Result<(), IntentStoreError> {
        let storage_key = checked_storage_key(key)?;
        let temp_path = self.scratch_path(&storage_key, "tmp");
        {
            let mut file = OpenOptions::new()
                .create_new(true)
                .write(true)
                .open(&temp_path)?;
            let line = serde_json::to_string(record)?;
            writeln!(file, "{line}")?;
            file.sync_all()?;
        }
        if let Err(err) = fs::rename(&temp_path, self.record_path(&storage_key)) {
            let _ = fs::remove_file(&temp_path);
            return Err(err.into());
        }
        Ok(())
    }

    fn read_record(path: &Path) -> Result<Option<IntentRecord>, IntentStoreError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(contents.trim())?))
    }

    fn take_record(&self, key: &IdentityKey) -> Result<Consumption, IntentStoreError> {
        let storage_key = checked_storage_key(key)?;
        let path = self.record_path(&storage_key);
        if !path.exists() {
            return Ok(Consumption::Absent);
        }

        let claim_path = self.scratch_path(&storage_key, "claim");
        match fs::rename(&path, &claim_path) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("lost consume race (key={storage_key})");
                return Ok(Consumption::AlreadyConsumed);
            }
            Err(err) => return Err(err.into()),
        }

        let record = Self::read_record(&claim_path);
        if let Err(err) = fs::remove_file(&claim_path) {
            warn!(
                "failed to remove claimed record (path={}): {err}",
                claim_path.display()
            );
        }
        match record? {
            Some(record) => Ok(Consumption::Consumed(record)),
            None => Ok(Consumption::AlreadyConsumed),
        }
    }
}

#[async_trait]
impl IntentBackend for LocalIntentStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Ephemeral
    }

    async fn save(
        &self,
        key: &IdentityKey,
        record: IntentRecord,
    ) -> Result<IntentRecord, IntentStoreError> {
        let record = record.stamped(Utc::now());
        self.write_record(key, &record)?;
        debug!(
            "saved pending search (key={}, primary_term_len={}, regions={})",
            key,
            record.params.primary_term.len(),
            record.params.scope.len()
        );
        Ok(record)
    }

    async fn load(&self, key: &IdentityKey) -> Result<Option<IntentRecord>, IntentStoreError> {
        let storage_key = checked_storage_key(key)?;
        Self::read_record(&self.record_path(&storage_key))
    }

    async fn clear(&self, key: &IdentityKey) -> Result<bool, IntentStoreError> {
        let storage_key = checked_storage_key(key)?;
        match fs::remove_file(self.record_path(&storage_key)) {
            Ok(()) => {
                debug!("cleared pending search (key={storage_key})");
                Ok(true)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    async fn consume(&self, key: &IdentityKey) -> Result<Consumption, IntentStoreError> {
        self.take_record(key)
    }
}

/// Local store namespaced by the current browsing session.
///
/// Records live under `<root>/<session id>/`, so two sessions sharing a
/// profile directory never see each other's pending searches.
#[derive(Debug, Clone)]
pub struct SessionIntentStore {
    root: PathBuf,
    correlator: Arc<SessionCorrelator>,
}

impl SessionIntentStore {
    pub fn new(
        root: impl AsRef<Path>,
        correlator: Arc<SessionCorrelator>,
    ) -> Result<Self, IntentStoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        info!("initialized session intent store (root={})", root.display());
        Ok(Self { root, correlator })
    }

    /// Store for the session active right now.
    fn scoped(&self) -> Result<LocalIntentStore, IntentStoreError> {
        let session = self.correlator.get_or_create_session_id()?;
        let root = self.root.join(session.to_string());
        fs::create_dir_all(&root)?;
        Ok(LocalIntentStore { root })
    }
}

#[async_trait]
impl IntentBackend for SessionIntentStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Session
    }

    async fn save(
        &self,
        key: &IdentityKey,
        record: IntentRecord,
    ) -> Result<IntentRecord, IntentStoreError> {
        self.scoped()?.save(key, record).await
    }

    async fn load(&self, key: &IdentityKey) -> Result<Option<IntentRecord>, IntentStoreError> {
        self.scoped()?.load(key).await
    }

    async fn clear(&self, key: &IdentityKey) -> Result<bool, IntentStoreError> {
        self.scoped()?.clear(key).await
    }

    async fn consume(&self, key: &IdentityKey) -> Result<Consumption, IntentStoreError> {
        self.scoped()?.consume(key).await
    }
}
