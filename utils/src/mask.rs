//! Masking helpers for log output.
//!
//! Contact-channel values and registry identifiers are personal data and
//! must never appear in full in log lines.

use praman_types::ChannelKey;

/// Mask all but the last four characters of a channel value.
pub fn mask_channel_value(key: &ChannelKey) -> String {
    format!("{}:{}", key.channel_type, mask_identifier(&key.value))
}

/// Mask all but the last four characters of an identifier.
/// Counts characters, not bytes; values are caller-supplied strings.
pub fn mask_identifier(id: &str) -> String {
    let total = id.chars().count();
    let hidden = total.saturating_sub(4);
    id.chars()
        .enumerate()
        .map(|(i, c)| if i < hidden { '*' } else { c })
        .collect()
}
