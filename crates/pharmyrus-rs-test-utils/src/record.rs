use parking_lot::Mutex;
use pharmyrus_rs_protocol::{EventSink, IntentEvent, IntentEventPayload, Navigation, Navigator};

/// Navigator that records every transition it is asked to perform.
#[derive(Default)]
pub struct RecordingNavigator {
    navigations: Mutex<Vec<Navigation>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn navigations(&self) -> Vec<Navigation> {
        self.navigations.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, navigation: Navigation) {
        self.navigations.lock().push(navigation);
    }
}

/// Event sink that keeps every payload in emission order.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<IntentEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payloads(&self) -> Vec<IntentEventPayload> {
        self.events
            .lock()
            .iter()
            .map(|event| event.payload.clone())
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: IntentEvent) {
        self.events.lock().push(event);
    }
}
