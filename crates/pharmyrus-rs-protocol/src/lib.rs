//! Shared types for Pharmyrus deferred searches, navigation, and events.

mod identity;
mod search;

pub use identity::{AuthState, IdentityKey, SessionKey, UserId};
pub use search::{
    DEFAULT_REGION, IntentRecord, RegionScope, SearchForm, SearchParams, ValidationError,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Navigation decided by the capture or resume flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "payload")]
pub enum Navigation {
    /// Open the search destination with these parameters as transition state.
    Destination(SearchParams),
    /// Send the user to the authentication surface.
    Authenticate,
}

/// Applies navigation decisions in the hosting application.
pub trait Navigator: Send + Sync {
    /// Perform the transition.
    fn navigate(&self, navigation: Navigation);
}

/// Diagnostic event emitted by the capture and resume flows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentEvent {
    /// Unique id for the event.
    pub id: Uuid,
    /// Timestamp when the event was created.
    pub created_at: DateTime<Utc>,
    /// Event payload content.
    pub payload: IntentEventPayload,
}

impl IntentEvent {
    pub fn new(payload: IntentEventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            payload,
        }
    }
}

/// All events emitted by the protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "payload")]
pub enum IntentEventPayload {
    /// A search was persisted before redirecting to authentication.
    IntentCaptured { key: String, primary_term: String },
    /// An authenticated submission went straight to the destination.
    DirectSearch { primary_term: String },
    /// A pending search was consumed and the destination triggered.
    IntentResumed { key: String, primary_term: String },
    /// A consumed search was dropped because the view went away.
    ResumeDiscarded { key: String },
    /// A backend call failed and was degraded.
    BackendFailed { operation: String, message: String },
}

/// Sink interface for protocol events.
pub trait EventSink: Send + Sync {
    /// Emit an event to downstream listeners.
    fn emit(&self, event: IntentEvent);
}
