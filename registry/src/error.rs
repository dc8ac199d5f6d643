use praman_store::StoreError;
use thiserror::Error;

/// Registry failures. Invariant violations and not-found reasons are
/// surfaced verbatim to callers, so every message reads as a complete
/// sentence fragment.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("an active profile already exists for this contact channel")]
    DuplicateChannel,

    #[error("contact channel has no fresh verified challenge")]
    UnverifiedChannel,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("profile {0} is blacklisted")]
    Blacklisted(String),

    #[error("profile {0} already has a tax identifier")]
    AlreadyLinked(String),

    #[error("owner set must not be empty")]
    EmptyOwnerSet,

    #[error("a sole proprietorship must have exactly one owner, got {0}")]
    OwnerCardinalityViolation(usize),

    #[error("unknown owner: {0}")]
    UnknownOwner(String),

    #[error("owner {0} is blacklisted")]
    OwnerBlacklisted(String),

    #[error("owner {0} appears more than once")]
    DuplicateOwner(String),

    #[error("issuing and counterparty entity identifiers must differ")]
    SelfDealing,

    #[error("reference number {0} is already used by this entity")]
    DuplicateReference(String),

    #[error("invalid line item: {0}")]
    InvalidLineItem(String),

    #[error("compliance score {0} is outside [0, 100]")]
    ScoreOutOfRange(u32),

    #[error("region code must be two uppercase alphanumeric characters, got {0:?}")]
    InvalidRegionCode(String),

    #[error("identifier allocation exhausted for namespace {0}")]
    Allocation(&'static str),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
