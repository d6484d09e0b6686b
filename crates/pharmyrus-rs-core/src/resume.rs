//! Resumption of a deferred search once the user is authenticated.

use crate::view::ViewHandle;
use log::{debug, info, warn};
use pharmyrus_rs_intent::{Consumption, IntentBackend};
use pharmyrus_rs_protocol::{
    AuthState, EventSink, IdentityKey, IntentEvent, IntentEventPayload, Navigation, Navigator,
    SearchParams, SessionKey, UserId,
};
use std::sync::Arc;

/// What a single resume attempt did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeOutcome {
    /// Authentication has not resolved yet.
    Unresolved,
    /// The user is anonymous; nothing to do.
    Anonymous,
    /// No pending search under any candidate key.
    NothingPending,
    /// The pending search was consumed and the destination triggered.
    Resumed(SearchParams),
    /// Another caller consumed the pending search first.
    AlreadyConsumed,
    /// The view went away before the destination could be triggered.
    Discarded,
    /// Storage failed; treated as nothing pending.
    BackendUnavailable,
}

/// Consumes the pending search and triggers the destination at most once.
#[derive(Clone)]
pub struct ResumeController {
    backend: Arc<dyn IntentBackend>,
    session_key: SessionKey,
    navigator: Arc<dyn Navigator>,
    view: ViewHandle,
    events: Option<Arc<dyn EventSink>>,
}

impl ResumeController {
    pub fn new(
        backend: Arc<dyn IntentBackend>,
        session_key: SessionKey,
        navigator: Arc<dyn Navigator>,
        view: ViewHandle,
    ) -> Self {
        Self {
            backend,
            session_key,
            navigator,
            view,
            events: None,
        }
    }

    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn view(&self) -> &ViewHandle {
        &self.view
    }

    /// React to an authentication state.
    pub async fn on_auth_state(&self, auth: &AuthState) -> ResumeOutcome {
        match auth {
            AuthState::Unresolved => ResumeOutcome::Unresolved,
            AuthState::Anonymous => ResumeOutcome::Anonymous,
            AuthState::Authenticated(user) => self.resume_for(user).await,
        }
    }

    async fn resume_for(&self, user: &UserId) -> ResumeOutcome {
        if !self.view.ready().await {
            debug!("view torn down before ready, skipping resume (user={user})");
            return ResumeOutcome::Discarded;
        }

        let mut lost_race = false;
        let mut backend_failed = false;
        for key in self.candidate_keys(user) {
            match self.backend.consume(&key).await {
                Ok(Consumption::Consumed(record)) => {
                    return self.trigger(&key, record.into_params());
                }
                Ok(Consumption::Absent) => {
                    debug!("no pending search (key={key})");
                }
                Ok(Consumption::AlreadyConsumed) => {
                    debug!("pending search consumed by another caller (key={key})");
                    lost_race = true;
                }
                Err(err) => {
                    warn!(
                        "failed to consume pending search (key={key}, backend={}): {err}",
                        self.backend.kind()
                    );
                    self.emit(IntentEventPayload::BackendFailed {
                        operation: "consume".to_string(),
                        message: err.to_string(),
                    });
                    backend_failed = true;
                }
            }
        }

        if lost_race {
            ResumeOutcome::AlreadyConsumed
        } else if backend_failed {
            ResumeOutcome::BackendUnavailable
        } else {
            ResumeOutcome::NothingPending
        }
    }

    /// User key first, then the session key the search was captured under.
    fn candidate_keys(&self, user: &UserId) -> [IdentityKey; 2] {
        [
            IdentityKey::User(user.clone()),
            IdentityKey::Session(self.session_key),
        ]
    }

    fn trigger(&self, key: &IdentityKey, params: SearchParams) -> ResumeOutcome {
        if !self.view.is_live() {
            warn!("dropping resumed search, view torn down (key={key})");
            self.emit(IntentEventPayload::ResumeDiscarded {
                key: key.storage_key(),
            });
            return ResumeOutcome::Discarded;
        }
        info!(
            "resuming pending search (key={key}, regions={})",
            params.scope.len()
        );
        self.emit(IntentEventPayload::IntentResumed {
            key: key.storage_key(),
            primary_term: params.primary_term.clone(),
        });
        self.navigator.navigate(Navigation::Destination(params.clone()));
        ResumeOutcome::Resumed(params)
    }

    fn emit(&self, payload: IntentEventPayload) {
        if let Some(events) = &self.events {
            events.emit(IntentEvent::new(payload));
        }
    }
}
