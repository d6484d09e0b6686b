//! Capture of searches submitted before authentication.

use crate::error::CaptureError;
use log::{debug, info, warn};
use pharmyrus_rs_intent::IntentBackend;
use pharmyrus_rs_protocol::{
    AuthState, EventSink, IdentityKey, IntentEvent, IntentEventPayload, IntentRecord, Navigation,
    RegionScope, SearchForm, SessionKey,
};
use std::sync::Arc;

/// Decides, on submit, between searching now and deferring behind login.
#[derive(Clone)]
pub struct CaptureController {
    backend: Arc<dyn IntentBackend>,
    session_key: SessionKey,
    default_scope: RegionScope,
    events: Option<Arc<dyn EventSink>>,
}

impl CaptureController {
    pub fn new(backend: Arc<dyn IntentBackend>, session_key: SessionKey) -> Self {
        Self {
            backend,
            session_key,
            default_scope: RegionScope::default(),
            events: None,
        }
    }

    /// Scope applied when the form selects no region.
    pub fn with_default_scope(mut self, scope: RegionScope) -> Self {
        self.default_scope = scope;
        self
    }

    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn session_key(&self) -> SessionKey {
        self.session_key
    }

    /// Handle a form submission.
    ///
    /// Authenticated users go straight to the destination without touching
    /// storage. Anonymous users get the search persisted under the session
    /// key first; navigation to authentication is only returned once that
    /// write has succeeded.
    pub async fn submit(
        &self,
        form: &SearchForm,
        is_authenticated: bool,
    ) -> Result<Navigation, CaptureError> {
        let params = form.validate(&self.default_scope)?;

        if is_authenticated {
            debug!(
                "direct search (primary_term_len={}, regions={})",
                params.primary_term.len(),
                params.scope.len()
            );
            self.emit(IntentEventPayload::DirectSearch {
                primary_term: params.primary_term.clone(),
            });
            return Ok(Navigation::Destination(params));
        }

        let key = IdentityKey::Session(self.session_key);
        let primary_term = params.primary_term.clone();
        match self.backend.save(&key, IntentRecord::new(params)).await {
            Ok(_) => {
                info!(
                    "captured pending search (key={key}, backend={})",
                    self.backend.kind()
                );
                self.emit(IntentEventPayload::IntentCaptured {
                    key: key.storage_key(),
                    primary_term,
                });
                Ok(Navigation::Authenticate)
            }
            Err(err) => {
                warn!(
                    "failed to capture pending search (key={key}, backend={}): {err}",
                    self.backend.kind()
                );
                self.emit(IntentEventPayload::BackendFailed {
                    operation: "save".to_string(),
                    message: err.to_string(),
                });
                Err(CaptureError::BackendUnavailable(err.to_string()))
            }
        }
    }

    /// Like [`submit`](Self::submit), treating an unresolved state as anonymous.
    pub async fn submit_with_state(
        &self,
        form: &SearchForm,
        auth: &AuthState,
    ) -> Result<Navigation, CaptureError> {
        self.submit(form, auth.is_authenticated()).await
    }

    fn emit(&self, payload: IntentEventPayload) {
        if let Some(events) = &self.events {
            events.emit(IntentEvent::new(payload));
        }
    }
}
