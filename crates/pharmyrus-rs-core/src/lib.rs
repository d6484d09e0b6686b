//! Deferred search capture and resume for Pharmyrus.
//!
//! This crate owns the capture and resume controllers, the auth watcher that
//! drives resumption, view liveness, and backend selection from config.

pub mod auth;
pub mod backend;
pub mod capture;
pub mod error;
pub mod events;
pub mod resume;
pub mod view;

pub use auth::watch_auth;
pub use backend::{backend_from_config, correlator_from_config};
pub use capture::CaptureController;
/// Error types surfaced by the controllers and wiring.
pub use error::{CaptureError, PharmyrusCoreError};
pub use events::EventBus;
pub use pharmyrus_rs_protocol::{EventSink, Navigator};
pub use resume::{ResumeController, ResumeOutcome};
pub use view::{ViewGuard, ViewHandle, ViewState, view_lifecycle};
