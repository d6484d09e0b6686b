//! Identity keys and authentication state.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identifier for one browsing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionKey(Uuid);

impl SessionKey {
    /// Generate a fresh random session key.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for SessionKey {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Stable identifier of an authenticated user, as issued by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key under which a pending search is stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "id")]
pub enum IdentityKey {
    /// Anonymous browsing session.
    Session(SessionKey),
    /// Authenticated user.
    User(UserId),
}

impl IdentityKey {
    /// Namespaced key used by backends for file names and document ids.
    ///
    /// User ids are opaque, so every byte outside `[A-Za-z0-9_-]` is written
    /// as `~XX` (upper-case hex). Distinct ids always map to distinct keys.
    pub fn storage_key(&self) -> String {
        match self {
            IdentityKey::Session(key) => format!("session-{key}"),
            IdentityKey::User(user) => format!("user-{}", escape_key_segment(user.as_str())),
        }
    }
}

fn escape_key_segment(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            escaped.push(char::from(byte));
        } else {
            escaped.push_str(&format!("~{byte:02X}"));
        }
    }
    escaped
}

impl From<SessionKey> for IdentityKey {
    fn from(key: SessionKey) -> Self {
        IdentityKey::Session(key)
    }
}

impl From<UserId> for IdentityKey {
    fn from(user: UserId) -> Self {
        IdentityKey::User(user)
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key())
    }
}

/// Current value exposed by the authentication provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "user")]
pub enum AuthState {
    /// Provider has not reported yet.
    #[default]
    Unresolved,
    /// No signed-in user.
    Anonymous,
    /// Signed-in user.
    Authenticated(UserId),
}

impl AuthState {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, AuthState::Unresolved)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    pub fn user(&self) -> Option<&UserId> {
        match self {
            AuthState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}
