//! Challenge store — time-bound one-time verification codes bound to a
//! (channel type, channel value) pair.
//!
//! A challenge moves through three states: live (issued, waiting for the
//! code), verified (code matched, spendable by exactly one registry
//! commit), and spent. At most one challenge exists per channel key;
//! issuing a new one replaces whatever was there.

pub mod code;
pub mod error;
pub mod store;

pub use code::generate_code;
pub use error::ChallengeError;
pub use store::{ChallengeSnapshot, ChallengeState, ChallengeStore, IssuedChallenge};
