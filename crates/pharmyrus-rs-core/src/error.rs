//! Error types for the capture and resume controllers.

use pharmyrus_rs_protocol::ValidationError;
use thiserror::Error;

/// Errors surfaced to the user when submitting a search.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The form did not pass validation. Nothing was stored.
    #[error("invalid search: {0}")]
    Validation(#[from] ValidationError),
    /// The pending search could not be stored. The user may resubmit.
    #[error("could not save pending search: {0}")]
    BackendUnavailable(String),
}

/// Errors returned while wiring the protocol from configuration.
#[derive(Debug, Error)]
pub enum PharmyrusCoreError {
    /// Storage backend could not be built.
    #[error("backend error: {0}")]
    Backend(String),
    /// Configuration is inconsistent.
    #[error("config error: {0}")]
    Config(String),
    /// Filesystem error while resolving storage paths.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
