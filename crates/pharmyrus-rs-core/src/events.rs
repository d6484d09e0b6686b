//! Broadcast event bus for protocol diagnostics.

use log::debug;
use pharmyrus_rs_protocol::{EventSink, IntentEvent};
use tokio::sync::broadcast;

/// Broadcast-backed sink fanning events out to every subscriber.
#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<IntentEvent>,
}

impl EventBus {
    /// Create a bus with the given channel buffer size.
    pub fn new(buffer: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer);
        debug!("intent event bus initialized (buffer={buffer})");
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<IntentEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

impl EventSink for EventBus {
    fn emit(&self, event: IntentEvent) {
        // No subscribers is fine.
        let _ = self.sender.send(event);
    }
}
