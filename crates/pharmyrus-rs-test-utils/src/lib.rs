//! Test helpers shared across Pharmyrus crates.

pub mod backend;
pub mod record;

pub use backend::{CallCounts, CountingBackend, FailingBackend, FailureMode};
pub use record::{RecordingNavigator, RecordingSink};
