//! Daemon configuration with TOML file support.

use praman_types::CoreParams;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the praman daemon.
///
/// Can be loaded from a TOML file via [`CoreConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Address the HTTP API binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Directory for snapshot persistence.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Seconds between periodic snapshots. Zero disables them.
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval_secs: u64,

    /// Seconds between challenge/flow pruning sweeps.
    #[serde(default = "default_prune_interval")]
    pub prune_interval_secs: u64,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Number of decimal digits in a challenge code.
    #[serde(default = "default_code_len")]
    pub challenge_code_len: usize,

    /// Seconds a challenge stays live after issue.
    #[serde(default = "default_challenge_ttl")]
    pub challenge_ttl_secs: u64,

    /// Seconds a verified challenge stays spendable.
    #[serde(default = "default_verification_window")]
    pub verification_window_secs: u64,

    /// Failed verify attempts allowed before a flow fails.
    #[serde(default = "default_max_attempts")]
    pub max_verify_attempts: u32,

    /// Echo challenge codes back in issue responses. Development only.
    #[serde(default)]
    pub dev_reveal_codes: bool,

    /// Allowed clock skew for signed evaluation requests.
    #[serde(default = "default_signature_skew")]
    pub signature_skew_secs: u64,

    /// Maximum results returned by search endpoints.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_listen_addr() -> String {
    "127.0.0.1:7140".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./praman_data")
}

fn default_snapshot_interval() -> u64 {
    60
}

fn default_prune_interval() -> u64 {
    30
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_code_len() -> usize {
    6
}

fn default_challenge_ttl() -> u64 {
    300
}

fn default_verification_window() -> u64 {
    600
}

fn default_max_attempts() -> u32 {
    5
}

fn default_signature_skew() -> u64 {
    300
}

fn default_search_limit() -> usize {
    20
}

impl Default for CoreConfig {
    fn default() -> Self {
        toml::from_str("").expect("empty config uses all defaults")
    }
}

impl CoreConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::from_toml_str(&contents)?)
    }

    /// The core parameters this configuration describes.
    pub fn params(&self) -> CoreParams {
        CoreParams {
            challenge_code_len: self.challenge_code_len,
            challenge_ttl_secs: self.challenge_ttl_secs,
            verification_window_secs: self.verification_window_secs,
            max_verify_attempts: self.max_verify_attempts,
            dev_reveal_codes: self.dev_reveal_codes,
            signature_skew_secs: self.signature_skew_secs,
            search_limit: self.search_limit,
        }
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join("core.snapshot")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = CoreConfig::from_toml_str("").unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:7140");
        assert_eq!(config.challenge_code_len, 6);
        assert!(!config.dev_reveal_codes);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config = CoreConfig::from_toml_str(
            r#"
            listen_addr = "0.0.0.0:8080"
            challenge_ttl_secs = 120
            dev_reveal_codes = true
            "#,
        )
        .unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.challenge_ttl_secs, 120);
        assert!(config.dev_reveal_codes);
        // Untouched fields keep their defaults.
        assert_eq!(config.verification_window_secs, 600);
        assert_eq!(config.params().max_verify_attempts, 5);
    }

    #[test]
    fn unknown_log_format_is_still_parsed() {
        let config = CoreConfig::from_toml_str("log_format = \"json\"").unwrap();
        assert_eq!(config.log_format, "json");
    }
}
