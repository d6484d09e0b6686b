//! Builds the configured storage backend and session correlator.

use crate::error::PharmyrusCoreError;
use directories::BaseDirs;
use log::{debug, info};
use pharmyrus_rs_config::{IntentBackendKind, PharmyrusConfig};
use pharmyrus_rs_intent::{
    HttpDocumentStore, IntentBackend, LocalIntentStore, RemoteIntentStore, SessionCorrelator,
    SessionIntentStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Build the session correlator backed by `session.path`.
///
/// The session id must outlive the login redirect, so the correlator is
/// always file-backed, under `~/.pharmyrus/session.json` by default.
pub fn correlator_from_config(
    config: &PharmyrusConfig,
) -> Result<Arc<SessionCorrelator>, PharmyrusCoreError> {
    let path = resolve_storage_path(config.session.path.as_ref(), "session.json")?;
    debug!("using persistent session correlator (path={})", path.display());
    Ok(Arc::new(SessionCorrelator::persistent(path)))
}

/// Build the pending-search backend selected by `intent.backend`.
pub fn backend_from_config(
    config: &PharmyrusConfig,
    correlator: Arc<SessionCorrelator>,
) -> Result<Arc<dyn IntentBackend>, PharmyrusCoreError> {
    let intent = &config.intent;
    let backend: Arc<dyn IntentBackend> = match intent.backend {
        IntentBackendKind::Ephemeral => {
            let root = resolve_storage_path(intent.path.as_ref(), "intents")?;
            Arc::new(LocalIntentStore::new(root).map_err(backend_error)?)
        }
        IntentBackendKind::Session => {
            let root = resolve_storage_path(intent.path.as_ref(), "intents")?;
            Arc::new(SessionIntentStore::new(root, correlator).map_err(backend_error)?)
        }
        IntentBackendKind::Remote => {
            let remote = &intent.remote;
            let Some(base_url) = remote.base_url.as_deref() else {
                return Err(PharmyrusCoreError::Config(
                    "intent.remote.base_url is required by the remote backend".to_string(),
                ));
            };
            let documents = HttpDocumentStore::new(
                base_url,
                remote.api_token.clone(),
                Duration::from_millis(remote.timeout_ms),
            )
            .map_err(backend_error)?;
            Arc::new(
                RemoteIntentStore::new(Arc::new(documents))
                    .with_field(remote.field.clone())
                    .with_max_conflict_retries(remote.max_conflict_retries),
            )
        }
    };
    info!("intent backend ready (kind={})", backend.kind());
    Ok(backend)
}

/// Resolve a config path against the cwd, or fall back to `~/.pharmyrus/<name>`.
fn resolve_storage_path(
    path: Option<&String>,
    fallback: &str,
) -> Result<PathBuf, PharmyrusCoreError> {
    let cwd = std::env::current_dir()?;
    if let Some(path) = path {
        let path = PathBuf::from(path);
        if path.is_absolute() {
            return Ok(path);
        }
        return Ok(cwd.join(path));
    }
    if let Some(home) = BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf()) {
        return Ok(home.join(".pharmyrus").join(fallback));
    }
    Ok(cwd.join(".pharmyrus").join(fallback))
}

fn backend_error(err: impl std::fmt::Display) -> PharmyrusCoreError {
    PharmyrusCoreError::Backend(err.to_string())
}
