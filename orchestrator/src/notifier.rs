//! Code delivery seam.
//!
//! Production deployments plug an SMS or email gateway in here; the
//! default implementation only logs, with the channel value masked.

use praman_types::ChannelKey;
use praman_utils::mask_channel_value;

/// Delivers challenge codes out of band. Implementations must not block
/// the calling thread for long; delivery failures are the implementation's
/// problem to retry or drop.
pub trait Notifier: Send + Sync {
    fn deliver_code(&self, channel: &ChannelKey, code: &str, reference: &str);
}

/// Logs delivery instead of sending anything. The code itself is never
/// logged.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn deliver_code(&self, channel: &ChannelKey, _code: &str, reference: &str) {
        tracing::info!(
            channel = %mask_channel_value(channel),
            reference,
            "challenge code dispatched"
        );
    }
}
