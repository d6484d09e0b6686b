use async_trait::async_trait;
use parking_lot::Mutex;
use pharmyrus_rs_intent::{BackendKind, Consumption, IntentBackend, IntentStoreError};
use pharmyrus_rs_protocol::{IdentityKey, IntentRecord};
use std::sync::Arc;

/// Which calls a [`FailingBackend`] rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Every call fails.
    All,
    /// `load` and `consume` fail; writes reach the inner backend.
    Reads,
}

/// Backend that reports itself unavailable.
pub struct FailingBackend {
    mode: FailureMode,
    inner: Option<Arc<dyn IntentBackend>>,
}

impl FailingBackend {
    /// Fail every call.
    pub fn new() -> Self {
        Self {
            mode: FailureMode::All,
            inner: None,
        }
    }

    /// Fail reads while delegating writes to `inner`.
    pub fn reads(inner: Arc<dyn IntentBackend>) -> Self {
        Self {
            mode: FailureMode::Reads,
            inner: Some(inner),
        }
    }

    fn unavailable() -> IntentStoreError {
        IntentStoreError::Unavailable("backend offline".to_string())
    }

    fn writer(&self) -> Result<&Arc<dyn IntentBackend>, IntentStoreError> {
        match (&self.mode, &self.inner) {
            (FailureMode::Reads, Some(inner)) => Ok(inner),
            _ => Err(Self::unavailable()),
        }
    }
}

impl Default for FailingBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IntentBackend for FailingBackend {
    fn kind(&self) -> BackendKind {
        self.inner
            .as_ref()
            .map_or(BackendKind::Ephemeral, |inner| inner.kind())
    }

    async fn save(
        &self,
        key: &IdentityKey,
        record: IntentRecord,
    ) -> Result<IntentRecord, IntentStoreError> {
        self.writer()?.save(key, record).await
    }

    async fn load(&self, _key: &IdentityKey) -> Result<Option<IntentRecord>, IntentStoreError> {
        Err(Self::unavailable())
    }

    async fn clear(&self, key: &IdentityKey) -> Result<bool, IntentStoreError> {
        self.writer()?.clear(key).await
    }

    async fn consume(&self, _key: &IdentityKey) -> Result<Consumption, IntentStoreError> {
        Err(Self::unavailable())
    }
}

/// Per-operation call counts observed by a [`CountingBackend`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub save: usize,
    pub load: usize,
    pub clear: usize,
    pub consume: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.save + self.load + self.clear + self.consume
    }
}

/// Wrapper counting every call made to the inner backend.
pub struct CountingBackend {
    inner: Arc<dyn IntentBackend>,
    counts: Mutex<CallCounts>,
}

impl CountingBackend {
    pub fn new(inner: Arc<dyn IntentBackend>) -> Self {
        Self {
            inner,
            counts: Mutex::new(CallCounts::default()),
        }
    }

    pub fn counts(&self) -> CallCounts {
        *self.counts.lock()
    }
}

#[async_trait]
impl IntentBackend for CountingBackend {
    fn kind(&self) -> BackendKind {
        self.inner.kind()
    }

    async fn save(
        &self,
        key: &IdentityKey,
        record: IntentRecord,
    ) -> Result<IntentRecord, IntentStoreError> {
        self.counts.lock().save += 1;
        self.inner.save(key, record).await
    }

    async fn load(&self, key: &IdentityKey) -> Result<Option<IntentRecord>, IntentStoreError> {
        self.counts.lock().load += 1;
        self.inner.load(key).await
    }

    async fn clear(&self, key: &IdentityKey) -> Result<bool, IntentStoreError> {
        self.counts.lock().clear += 1;
        self.inner.clear(key).await
    }

    async fn consume(&self, key: &IdentityKey) -> Result<Consumption, IntentStoreError> {
        self.counts.lock().consume += 1;
        self.inner.consume(key).await
    }
}
