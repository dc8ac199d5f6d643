use praman_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("consumer {0} already holds an active credential")]
    DuplicateConsumer(String),

    #[error("no active credential for consumer {0}")]
    UnknownConsumer(String),

    /// Covers both never-issued and revoked keys so callers cannot probe
    /// which of the two it was.
    #[error("unknown or revoked api key")]
    UnknownKey,

    #[error("request timestamp outside the accepted window")]
    StaleRequest,

    #[error("request signature does not match")]
    BadSignature,

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
