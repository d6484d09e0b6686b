//! Public SDK surface for Pharmyrus deferred searches.
//!
//! This crate re-exports the building blocks and wires them together from
//! configuration so embedding applications get a consistent setup.

/// Re-export for convenience.
pub use pharmyrus_rs_config as config;
pub use pharmyrus_rs_core as core;
/// Re-export for convenience.
pub use pharmyrus_rs_intent as intent;
/// Re-export for convenience.
pub use pharmyrus_rs_protocol as protocol;

use anyhow::Context;
use log::info;
use pharmyrus_rs_config::PharmyrusConfig;
use pharmyrus_rs_core::{
    CaptureController, EventBus, ResumeController, ViewHandle, backend_from_config,
    correlator_from_config,
};
use pharmyrus_rs_intent::{IntentBackend, SessionCorrelator};
use pharmyrus_rs_protocol::{EventSink, Navigator, SessionKey};
use std::path::Path;
use std::sync::Arc;

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// This is a no-op if the feature is not enabled. Hosts are still expected
/// to call this early in startup to ensure log output is wired up.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::try_init();
    }
}

/// Controllers sharing one backend, session, and event bus.
pub struct DeferredSearch {
    config: PharmyrusConfig,
    correlator: Arc<SessionCorrelator>,
    backend: Arc<dyn IntentBackend>,
    session_key: SessionKey,
    events: EventBus,
    navigator: Arc<dyn Navigator>,
}

impl DeferredSearch {
    /// Wire the protocol from an already loaded config.
    pub fn from_config(
        config: PharmyrusConfig,
        navigator: Arc<dyn Navigator>,
    ) -> anyhow::Result<Self> {
        config.validate().context("invalid pharmyrus config")?;
        let correlator = correlator_from_config(&config)?;
        let backend = backend_from_config(&config, correlator.clone())?;
        let session_key = correlator
            .get_or_create_session_id()
            .context("failed to start browsing session")?;
        info!(
            "deferred search ready (backend={}, session={session_key})",
            backend.kind()
        );
        Ok(Self {
            config,
            correlator,
            backend,
            session_key,
            events: EventBus::default(),
            navigator,
        })
    }

    /// Load layered config starting from `cwd` and wire the protocol.
    pub fn load(cwd: impl AsRef<Path>, navigator: Arc<dyn Navigator>) -> anyhow::Result<Self> {
        let layered = PharmyrusConfig::load_layered(cwd).context("failed to load config")?;
        Self::from_config(layered.config, navigator)
    }

    pub fn config(&self) -> &PharmyrusConfig {
        &self.config
    }

    pub fn session_key(&self) -> SessionKey {
        self.session_key
    }

    pub fn backend(&self) -> Arc<dyn IntentBackend> {
        self.backend.clone()
    }

    /// Event bus receiving capture and resume diagnostics.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Capture controller for the current session.
    pub fn capture(&self) -> CaptureController {
        CaptureController::new(self.backend.clone(), self.session_key)
            .with_default_scope(self.config.default_scope())
            .with_event_sink(self.event_sink())
    }

    /// Resume controller bound to the given view.
    pub fn resume(&self, view: ViewHandle) -> ResumeController {
        ResumeController::new(
            self.backend.clone(),
            self.session_key,
            self.navigator.clone(),
            view,
        )
        .with_event_sink(self.event_sink())
    }

    /// End the browsing session. Later instances start a fresh one.
    pub fn end_session(&self) -> anyhow::Result<()> {
        self.correlator
            .end_session()
            .context("failed to end browsing session")?;
        Ok(())
    }

    fn event_sink(&self) -> Arc<dyn EventSink> {
        Arc::new(self.events.clone())
    }
}
