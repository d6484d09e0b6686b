//! Configuration schema for Pharmyrus.

use serde::{Deserialize, Serialize};

/// Root config for the Pharmyrus deferred search SDK.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PharmyrusConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub intent: IntentConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl PharmyrusConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> PharmyrusConfigBuilder {
        PharmyrusConfigBuilder::new()
    }
}

/// Builder for assembling a `PharmyrusConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct PharmyrusConfigBuilder {
    config: PharmyrusConfig,
}

impl PharmyrusConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: PharmyrusConfig::default(),
        }
    }

    /// Replace the pending-search storage configuration.
    pub fn intent(mut self, intent: IntentConfig) -> Self {
        self.config.intent = intent;
        self
    }

    /// Replace the session correlation configuration.
    pub fn session(mut self, session: SessionConfig) -> Self {
        self.config.session = session;
        self
    }

    /// Finalize and return the built `PharmyrusConfig`.
    pub fn build(self) -> PharmyrusConfig {
        self.config
    }
}

/// Storage backend used for pending searches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum IntentBackendKind {
    /// Local files keyed by identity only.
    Ephemeral,
    /// Local files namespaced by browsing session.
    #[default]
    Session,
    /// Remote per-user document store.
    Remote,
}

/// Pending-search storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentConfig {
    #[serde(default)]
    pub backend: IntentBackendKind,
    /// Root directory for the local stores.
    #[serde(default)]
    pub path: Option<String>,
    /// Scope applied when a submission selects no region.
    #[serde(default = "default_scope")]
    pub default_scope: Vec<String>,
    #[serde(default)]
    pub remote: RemoteStoreConfig,
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            backend: IntentBackendKind::default(),
            path: None,
            default_scope: default_scope(),
            remote: RemoteStoreConfig::default(),
        }
    }
}

fn default_scope() -> Vec<String> {
    vec!["BR".to_string()]
}

/// Remote document store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteStoreConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_token: Option<String>,
    /// Document field holding the pending search.
    #[serde(default = "default_remote_field")]
    pub field: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Re-reads allowed when a conditional write loses to a sibling update.
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,
}

impl Default for RemoteStoreConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_token: None,
            field: default_remote_field(),
            timeout_ms: default_timeout_ms(),
            max_conflict_retries: default_max_conflict_retries(),
        }
    }
}

/// Default document field for the pending search.
fn default_remote_field() -> String {
    "pendingSearch".to_string()
}

/// Default HTTP request timeout in milliseconds.
fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_conflict_retries() -> u32 {
    3
}

/// Session correlation settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionConfig {
    /// File persisting the session id across reloads.
    ///
    /// Defaults to `~/.pharmyrus/session.json` when unset.
    #[serde(default)]
    pub path: Option<String>,
}
