use praman_challenge::ChallengeError;
use praman_registry::RegistryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("no active flow for this channel")]
    NoActiveFlow,

    #[error("flow has exhausted its verification attempts")]
    TooManyAttempts,

    #[error(transparent)]
    Challenge(#[from] ChallengeError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
