//! Capability set shared by every pending-search backend.

use crate::error::IntentStoreError;
use async_trait::async_trait;
use pharmyrus_rs_protocol::{IdentityKey, IntentRecord};
use std::fmt;

/// Backend variant, used for logging and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Local files keyed by identity.
    Ephemeral,
    /// Local files namespaced by browsing session.
    Session,
    /// Remote per-user documents.
    Remote,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Ephemeral => "ephemeral",
            BackendKind::Session => "session",
            BackendKind::Remote => "remote",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of the atomic compare-and-clear step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Consumption {
    /// This caller cleared the record and owns it.
    Consumed(IntentRecord),
    /// Nothing was pending under the key.
    Absent,
    /// A record was pending but a concurrent caller cleared it first.
    AlreadyConsumed,
}

#[async_trait]
/// Durable holder of at most one pending search per identity key.
///
/// Every call may suspend; callers must not assume a backend answers
/// synchronously.
pub trait IntentBackend: Send + Sync {
    /// Variant of this backend.
    fn kind(&self) -> BackendKind;

    /// Store a record, replacing any unconsumed one under the same key.
    ///
    /// Returns the record as persisted, stamped with its capture time.
    async fn save(
        &self,
        key: &IdentityKey,
        record: IntentRecord,
    ) -> Result<IntentRecord, IntentStoreError>;

    /// Read the pending record without consuming it.
    async fn load(&self, key: &IdentityKey) -> Result<Option<IntentRecord>, IntentStoreError>;

    /// Drop the pending record. Returns whether one was present.
    async fn clear(&self, key: &IdentityKey) -> Result<bool, IntentStoreError>;

    /// Atomically take the pending record.
    ///
    /// Among concurrent callers on one key at most one observes `Consumed`.
    async fn consume(&self, key: &IdentityKey) -> Result<Consumption, IntentStoreError>;
}

/// Check that a storage key is safe as a file name and URL path segment.
pub(crate) fn checked_storage_key(key: &IdentityKey) -> Result<String, IntentStoreError> {
    let storage_key = key.storage_key();
    let valid = storage_key
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '~'));
    if !valid || storage_key.len() > 200 {
        return Err(IntentStoreError::InvalidKey(storage_key));
    }
    Ok(storage_key)
}
