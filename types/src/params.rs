//! Core parameters — every tunable the issuance core depends on.

use serde::{Deserialize, Serialize};

/// Tunable parameters for the issuance core.
///
/// Loaded from the daemon config; tests construct cut-down values directly.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CoreParams {
    // ── Challenges ───────────────────────────────────────────────────────
    /// Number of decimal digits in a challenge code.
    pub challenge_code_len: usize,

    /// Seconds a challenge stays live after issue.
    pub challenge_ttl_secs: u64,

    /// Seconds a *verified* challenge stays spendable by a registry commit.
    pub verification_window_secs: u64,

    /// Failed verify attempts allowed before a flow instance fails.
    pub max_verify_attempts: u32,

    /// When true, issued codes are echoed back in the issue response.
    /// Production configurations must leave this off; the code then only
    /// travels over the notification channel.
    pub dev_reveal_codes: bool,

    // ── Credentials ──────────────────────────────────────────────────────
    /// Allowed clock skew (seconds, either direction) for signed requests.
    pub signature_skew_secs: u64,

    // ── Lookups ──────────────────────────────────────────────────────────
    /// Maximum results returned by a search operation.
    pub search_limit: usize,
}

impl CoreParams {
    /// Production defaults.
    pub fn issuance_defaults() -> Self {
        Self {
            challenge_code_len: 6,
            challenge_ttl_secs: 300,
            verification_window_secs: 600,
            max_verify_attempts: 5,
            dev_reveal_codes: false,
            signature_skew_secs: 300,
            search_limit: 20,
        }
    }

    /// Defaults for development: codes are echoed back to the caller.
    pub fn dev_defaults() -> Self {
        Self {
            dev_reveal_codes: true,
            ..Self::issuance_defaults()
        }
    }
}

impl Default for CoreParams {
    fn default() -> Self {
        Self::issuance_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_defaults_never_reveal_codes() {
        assert!(!CoreParams::issuance_defaults().dev_reveal_codes);
        assert!(CoreParams::dev_defaults().dev_reveal_codes);
    }
}
