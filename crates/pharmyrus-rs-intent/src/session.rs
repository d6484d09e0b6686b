//! Session correlation for anonymous visitors.

use crate::error::IntentStoreError;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use parking_lot::Mutex;
use pharmyrus_rs_protocol::SessionKey;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    session_id: SessionKey,
    started_at: DateTime<Utc>,
}

/// Hands out one stable session key per browsing session.
///
/// The key is created on first use and kept until [`end_session`] is called.
/// With a backing file, reloads within the same session observe the same key.
///
/// [`end_session`]: SessionCorrelator::end_session
#[derive(Debug)]
pub struct SessionCorrelator {
    path: Option<PathBuf>,
    current: Mutex<Option<SessionKey>>,
}

impl SessionCorrelator {
    /// Correlator that keeps the key in memory only.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            current: Mutex::new(None),
        }
    }

    /// Correlator persisting the key to `path`.
    pub fn persistent(path: impl AsRef<Path>) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
            current: Mutex::new(None),
        }
    }

    /// Return the current session key, creating one on first call.
    pub fn get_or_create_session_id(&self) -> Result<SessionKey, IntentStoreError> {
        let mut current = self.current.lock();
        if let Some(key) = *current {
            return Ok(key);
        }

        if let Some(path) = &self.path
            && let Some(key) = read_session_file(path)?
        {
            debug!("restored session key (session_id={key})");
            *current = Some(key);
            return Ok(key);
        }

        let key = SessionKey::generate();
        if let Some(path) = &self.path {
            write_session_file(path, key)?;
        }
        info!("started session (session_id={key})");
        *current = Some(key);
        Ok(key)
    }

    /// End the current session. The next call starts a fresh one.
    pub fn end_session(&self) -> Result<Option<SessionKey>, IntentStoreError> {
        let mut current = self.current.lock();
        let ended = current.take();
        if let Some(path) = &self.path {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(IntentStoreError::Io(err)),
            }
        }
        if let Some(key) = ended {
            info!("ended session (session_id={key})");
        }
        Ok(ended)
    }
}

fn read_session_file(path: &Path) -> Result<Option<SessionKey>, IntentStoreError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(IntentStoreError::Io(err)),
    };
    match serde_json::from_str::<SessionFile>(&contents) {
        Ok(file) => Ok(Some(file.session_id)),
        Err(err) => {
            warn!(
                "invalid session file ignored (path={}): {err}",
                path.display()
            );
            Ok(None)
        }
    }
}

fn write_session_file(path: &Path, key: SessionKey) -> Result<(), IntentStoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = SessionFile {
        session_id: key,
        started_at: Utc::now(),
    };
    let serialized = serde_json::to_string(&file)?;
    let mut handle = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)?;
    writeln!(handle, "{serialized}")?;
    Ok(())
}
