//! Nullable code delivery — records instead of sending.

use praman_orchestrator::Notifier;
use praman_types::ChannelKey;
use std::sync::Mutex;

/// A delivery captured by [`NullNotifier`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delivery {
    pub channel: ChannelKey,
    pub code: String,
    pub reference: String,
}

/// Records every code delivery for later inspection.
#[derive(Debug, Default)]
pub struct NullNotifier {
    deliveries: Mutex<Vec<Delivery>>,
}

impl NullNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().unwrap().clone()
    }

    /// The most recently delivered code for a channel, if any.
    pub fn last_code_for(&self, channel: &ChannelKey) -> Option<String> {
        self.deliveries
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|d| &d.channel == channel)
            .map(|d| d.code.clone())
    }
}

impl Notifier for NullNotifier {
    fn deliver_code(&self, channel: &ChannelKey, code: &str, reference: &str) {
        self.deliveries.lock().unwrap().push(Delivery {
            channel: channel.clone(),
            code: code.to_string(),
            reference: reference.to_string(),
        });
    }
}
