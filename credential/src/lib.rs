//! Consumer credentialing for external evaluation consumers.
//!
//! Mints API key / secret pairs, stores only a digest of the secret, and
//! verifies signed requests: `HMAC-SHA256` over `"{timestamp}." + body`
//! keyed by the SHA-256 digest of the consumer's secret.

pub mod error;
pub mod service;
pub mod sign;

pub use error::CredentialError;
pub use service::{CredentialService, MintedCredential};
pub use sign::{derive_signing_key, sign_request};
