//! Durable storage for searches deferred across authentication.

pub mod backend;
pub mod document;
pub mod error;
pub mod http;
pub mod local;
pub mod remote;
pub mod session;

/// Storage error type.
pub use error::IntentStoreError;
/// Backend capability set and consumption outcome.
pub use backend::{BackendKind, Consumption, IntentBackend};
/// Document store interface and implementations.
pub use document::{Document, DocumentStore, MemoryDocumentStore, Precondition};
pub use http::HttpDocumentStore;
/// Local file-backed stores.
pub use local::{LocalIntentStore, SessionIntentStore};
/// Remote per-user store.
pub use remote::{DEFAULT_PENDING_FIELD, LAST_RESUMED_AT_FIELD, RemoteIntentStore};
/// Session correlation.
pub use session::SessionCorrelator;
