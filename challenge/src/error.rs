use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChallengeError {
    /// No live challenge exists for the key (never issued, replaced, or
    /// past its expiry).
    #[error("no live challenge for this channel, or the challenge has expired")]
    Expired,

    /// The submitted code does not match the live challenge.
    #[error("submitted code does not match")]
    CodeMismatch,

    /// The challenge was already verified or spent; verification is
    /// one-shot.
    #[error("challenge has already been consumed")]
    AlreadyConsumed,

    /// A commit tried to spend a challenge that was never verified.
    #[error("channel has no verified challenge to spend")]
    NotVerified,

    /// The verification happened too long ago to back a commit.
    #[error("challenge verification is no longer within the validity window")]
    WindowElapsed,
}
