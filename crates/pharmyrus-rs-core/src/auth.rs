//! Drives the resume controller from authentication state changes.

use crate::resume::{ResumeController, ResumeOutcome};
use log::debug;
use pharmyrus_rs_protocol::AuthState;
use tokio::sync::watch;

/// Run the resume controller on every resolution of the auth state.
///
/// The current value is handled first. Repeated notifications of the same
/// resolved state are skipped, and a fall back to `Unresolved` is ignored.
/// Returns the outcomes in order once the sender is dropped or the view is
/// torn down.
pub async fn watch_auth(
    controller: &ResumeController,
    mut auth: watch::Receiver<AuthState>,
) -> Vec<ResumeOutcome> {
    let mut outcomes = Vec::new();
    let mut last_resolved: Option<AuthState> = None;
    let view = controller.view().clone();

    loop {
        let current = auth.borrow_and_update().clone();
        if current.is_resolved() && last_resolved.as_ref() != Some(&current) {
            let outcome = controller.on_auth_state(&current).await;
            debug!("auth transition handled (state={current:?}, outcome={outcome:?})");
            outcomes.push(outcome);
            last_resolved = Some(current);
        }

        if !view.is_live() {
            break;
        }
        tokio::select! {
            changed = auth.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = view.torn_down() => break,
        }
    }
    outcomes
}
