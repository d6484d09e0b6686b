//! Liveness of the view hosting the resume flow.

use tokio::sync::watch;

/// Lifecycle of the hosting view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// Mounted but not ready to navigate.
    Mounting,
    /// Ready to apply navigation.
    Ready,
    /// Gone. Pending navigation must be dropped.
    TornDown,
}

/// Owned by the view. Dropping it tears the view down.
#[derive(Debug)]
pub struct ViewGuard {
    sender: watch::Sender<ViewState>,
}

/// Observes the view's lifecycle.
#[derive(Debug, Clone)]
pub struct ViewHandle {
    receiver: watch::Receiver<ViewState>,
}

/// Create a guard/handle pair for a view that is still mounting.
pub fn view_lifecycle() -> (ViewGuard, ViewHandle) {
    let (sender, receiver) = watch::channel(ViewState::Mounting);
    (ViewGuard { sender }, ViewHandle { receiver })
}

impl ViewGuard {
    /// Report that the view can accept navigation.
    pub fn mark_ready(&self) {
        self.sender.send_if_modified(|state| {
            if *state == ViewState::Mounting {
                *state = ViewState::Ready;
                true
            } else {
                false
            }
        });
    }

    /// Tear the view down now instead of on drop.
    pub fn tear_down(self) {}
}

impl Drop for ViewGuard {
    fn drop(&mut self) {
        self.sender.send_replace(ViewState::TornDown);
    }
}

impl ViewHandle {
    /// Handle for hosts without a view lifecycle; always ready.
    pub fn always_ready() -> Self {
        let (_sender, receiver) = watch::channel(ViewState::Ready);
        Self { receiver }
    }

    pub fn state(&self) -> ViewState {
        *self.receiver.borrow()
    }

    pub fn is_live(&self) -> bool {
        self.state() != ViewState::TornDown
    }

    /// Wait until the view leaves `Mounting`. Returns `true` if it became ready.
    pub async fn ready(&self) -> bool {
        let mut receiver = self.receiver.clone();
        match receiver
            .wait_for(|state| *state != ViewState::Mounting)
            .await
        {
            Ok(state) => *state == ViewState::Ready,
            Err(_) => false,
        }
    }

    /// Resolve once the view is torn down; never resolves for detached handles.
    pub async fn torn_down(&self) {
        let mut receiver = self.receiver.clone();
        if receiver
            .wait_for(|state| *state == ViewState::TornDown)
            .await
            .is_err()
        {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ViewHandle, ViewState, view_lifecycle};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn ready_resolves_after_mark_ready() {
        let (guard, handle) = view_lifecycle();
        assert_eq!(handle.state(), ViewState::Mounting);
        let waiter = tokio::spawn({
            let handle = handle.clone();
            async move { handle.ready().await }
        });
        guard.mark_ready();
        assert!(waiter.await.expect("join"));
        assert!(handle.is_live());
    }

    #[tokio::test]
    async fn ready_is_false_when_torn_down_first() {
        let (guard, handle) = view_lifecycle();
        guard.tear_down();
        assert!(!handle.ready().await);
        assert!(!handle.is_live());
        handle.torn_down().await;
    }

    #[tokio::test]
    async fn mark_ready_does_not_revive_a_torn_down_view() {
        let (guard, handle) = view_lifecycle();
        guard.mark_ready();
        guard.mark_ready();
        assert_eq!(handle.state(), ViewState::Ready);
        drop(guard);
        assert_eq!(handle.state(), ViewState::TornDown);
    }

    #[tokio::test]
    async fn detached_handle_is_ready() {
        let handle = ViewHandle::always_ready();
        assert!(handle.ready().await);
        assert!(handle.is_live());
    }
}
