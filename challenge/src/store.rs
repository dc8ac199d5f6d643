//! The challenge store proper: issue, verify, spend.

use crate::code::{generate_code, generate_reference};
use crate::error::ChallengeError;
use praman_types::{ChannelKey, CoreParams, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

/// Lifecycle state of a challenge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChallengeState {
    /// Issued, waiting for the code to be submitted.
    Live,
    /// Code matched; spendable by exactly one registry commit until the
    /// validity window closes.
    Verified { verified_at: Timestamp },
    /// Consumed by a commit.
    Spent,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct ChallengeRecord {
    reference: String,
    code: String,
    issued_at: Timestamp,
    expires_at: Timestamp,
    state: ChallengeState,
}

/// Returned from `issue`. The code is handed to the notification channel
/// by the orchestrator; whether it also reaches the caller is governed by
/// `CoreParams::dev_reveal_codes`.
#[derive(Clone, Debug)]
pub struct IssuedChallenge {
    pub reference: String,
    pub code: String,
    pub expires_at: Timestamp,
}

/// Serializable snapshot of all in-flight challenges.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChallengeSnapshot {
    challenges: HashMap<ChannelKey, ChallengeRecord>,
}

/// Thread-safe challenge store.
///
/// A single mutex guards the map, so concurrent verify or spend calls for
/// the same challenge resolve to exactly one success.
pub struct ChallengeStore {
    challenges: Mutex<HashMap<ChannelKey, ChallengeRecord>>,
    code_len: usize,
    ttl_secs: u64,
    window_secs: u64,
}

impl ChallengeStore {
    pub fn new(params: &CoreParams) -> Self {
        Self {
            challenges: Mutex::new(HashMap::new()),
            code_len: params.challenge_code_len,
            ttl_secs: params.challenge_ttl_secs,
            window_secs: params.verification_window_secs,
        }
    }

    /// Issue a fresh challenge for a channel key.
    ///
    /// Any prior challenge for the same key — live, verified, or spent —
    /// is replaced, so at most one can ever be outstanding per key.
    pub fn issue(&self, key: &ChannelKey, now: Timestamp) -> IssuedChallenge {
        let record = ChallengeRecord {
            reference: generate_reference(),
            code: generate_code(self.code_len),
            issued_at: now,
            expires_at: now.plus_secs(self.ttl_secs),
            state: ChallengeState::Live,
        };
        let issued = IssuedChallenge {
            reference: record.reference.clone(),
            code: record.code.clone(),
            expires_at: record.expires_at,
        };
        self.challenges.lock().unwrap().insert(key.clone(), record);
        issued
    }

    /// Verify a submitted code against the live challenge for a key.
    ///
    /// Success is one-shot: the challenge moves to `Verified` and a second
    /// call with the same (correct) code fails with `AlreadyConsumed`.
    pub fn verify(
        &self,
        key: &ChannelKey,
        submitted: &str,
        now: Timestamp,
    ) -> Result<(), ChallengeError> {
        let mut challenges = self.challenges.lock().unwrap();
        let record = challenges.get_mut(key).ok_or(ChallengeError::Expired)?;

        match record.state {
            ChallengeState::Verified { .. } | ChallengeState::Spent => {
                return Err(ChallengeError::AlreadyConsumed);
            }
            ChallengeState::Live => {}
        }

        if now >= record.expires_at {
            return Err(ChallengeError::Expired);
        }
        if record.code != submitted {
            return Err(ChallengeError::CodeMismatch);
        }

        record.state = ChallengeState::Verified { verified_at: now };
        Ok(())
    }

    /// Spend a verified challenge on behalf of a registry commit.
    ///
    /// One-shot like `verify`; the spent challenge cannot back another
    /// commit, and a verification older than the validity window is
    /// rejected.
    pub fn spend(&self, key: &ChannelKey, now: Timestamp) -> Result<(), ChallengeError> {
        let mut challenges = self.challenges.lock().unwrap();
        let record = challenges.get_mut(key).ok_or(ChallengeError::NotVerified)?;

        match record.state {
            ChallengeState::Live => Err(ChallengeError::NotVerified),
            ChallengeState::Spent => Err(ChallengeError::AlreadyConsumed),
            ChallengeState::Verified { verified_at } => {
                if verified_at.has_expired(self.window_secs, now) {
                    return Err(ChallengeError::WindowElapsed);
                }
                record.state = ChallengeState::Spent;
                Ok(())
            }
        }
    }

    /// Whether a spendable verification currently exists for the key.
    pub fn has_verified(&self, key: &ChannelKey, now: Timestamp) -> bool {
        let challenges = self.challenges.lock().unwrap();
        matches!(
            challenges.get(key).map(|r| &r.state),
            Some(ChallengeState::Verified { verified_at })
                if !verified_at.has_expired(self.window_secs, now)
        )
    }

    /// Drop records whose expiry and validity window have both passed.
    /// Called periodically from the daemon.
    pub fn prune_expired(&self, now: Timestamp) -> usize {
        let mut challenges = self.challenges.lock().unwrap();
        let before = challenges.len();
        challenges.retain(|_, r| match r.state {
            ChallengeState::Live => now < r.expires_at,
            ChallengeState::Verified { verified_at } => {
                !verified_at.has_expired(self.window_secs, now)
            }
            ChallengeState::Spent => false,
        });
        before - challenges.len()
    }

    /// Serialize in-flight challenges for persistence.
    pub fn snapshot(&self) -> ChallengeSnapshot {
        ChallengeSnapshot {
            challenges: self.challenges.lock().unwrap().clone(),
        }
    }

    /// Restore a store from a persisted snapshot.
    pub fn restore(snapshot: ChallengeSnapshot, params: &CoreParams) -> Self {
        Self {
            challenges: Mutex::new(snapshot.challenges),
            code_len: params.challenge_code_len,
            ttl_secs: params.challenge_ttl_secs,
            window_secs: params.verification_window_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use praman_types::ChannelType;
    use std::sync::Arc;

    fn store() -> ChallengeStore {
        ChallengeStore::new(&CoreParams::issuance_defaults())
    }

    fn key() -> ChannelKey {
        ChannelKey::new(ChannelType::Phone, "9000000001")
    }

    #[test]
    fn verify_with_correct_code_succeeds_exactly_once() {
        let store = store();
        let now = Timestamp::new(1000);
        let issued = store.issue(&key(), now);

        assert_eq!(store.verify(&key(), &issued.code, now), Ok(()));
        assert_eq!(
            store.verify(&key(), &issued.code, now),
            Err(ChallengeError::AlreadyConsumed)
        );
    }

    #[test]
    fn wrong_code_is_mismatch_and_challenge_survives() {
        let store = store();
        let now = Timestamp::new(1000);
        let issued = store.issue(&key(), now);
        let wrong = if issued.code == "111111" { "222222" } else { "111111" };

        assert_eq!(
            store.verify(&key(), wrong, now),
            Err(ChallengeError::CodeMismatch)
        );
        // Still live: the correct code works afterwards.
        assert_eq!(store.verify(&key(), &issued.code, now), Ok(()));
    }

    #[test]
    fn verify_after_expiry_fails_regardless_of_code() {
        let store = store();
        let issued = store.issue(&key(), Timestamp::new(1000));
        let late = Timestamp::new(1000 + 300);
        assert_eq!(
            store.verify(&key(), &issued.code, late),
            Err(ChallengeError::Expired)
        );
    }

    #[test]
    fn verify_with_no_challenge_fails_expired() {
        let store = store();
        assert_eq!(
            store.verify(&key(), "123456", Timestamp::new(1000)),
            Err(ChallengeError::Expired)
        );
    }

    #[test]
    fn reissue_invalidates_prior_challenge() {
        let store = store();
        let now = Timestamp::new(1000);
        let first = store.issue(&key(), now);
        let second = store.issue(&key(), now);

        // The first code no longer verifies even though it would otherwise
        // still be valid.
        if first.code != second.code {
            assert_eq!(
                store.verify(&key(), &first.code, now),
                Err(ChallengeError::CodeMismatch)
            );
        }
        assert_eq!(store.verify(&key(), &second.code, now), Ok(()));
    }

    #[test]
    fn spend_requires_verification_and_is_one_shot() {
        let store = store();
        let now = Timestamp::new(1000);
        let issued = store.issue(&key(), now);

        assert_eq!(store.spend(&key(), now), Err(ChallengeError::NotVerified));
        store.verify(&key(), &issued.code, now).unwrap();
        assert_eq!(store.spend(&key(), now), Ok(()));
        assert_eq!(
            store.spend(&key(), now),
            Err(ChallengeError::AlreadyConsumed)
        );
    }

    #[test]
    fn spend_outside_validity_window_fails() {
        let store = store();
        let issued = store.issue(&key(), Timestamp::new(1000));
        store
            .verify(&key(), &issued.code, Timestamp::new(1010))
            .unwrap();
        let late = Timestamp::new(1010 + 600);
        assert_eq!(store.spend(&key(), late), Err(ChallengeError::WindowElapsed));
    }

    #[test]
    fn concurrent_verifies_yield_exactly_one_success() {
        let store = Arc::new(store());
        let now = Timestamp::new(1000);
        let issued = store.issue(&key(), now);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            let code = issued.code.clone();
            handles.push(std::thread::spawn(move || {
                store.verify(&key(), &code, now)
            }));
        }
        let results: Vec<Result<(), ChallengeError>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1, "exactly one verify must win the race");
        for r in results.iter().filter(|r| r.is_err()) {
            assert_eq!(*r, Err(ChallengeError::AlreadyConsumed));
        }
    }

    #[test]
    fn prune_drops_spent_and_expired() {
        let store = store();
        let now = Timestamp::new(1000);
        let issued = store.issue(&key(), now);
        store.verify(&key(), &issued.code, now).unwrap();
        store.spend(&key(), now).unwrap();

        let other = ChannelKey::new(ChannelType::Phone, "9000000002");
        store.issue(&other, now);

        assert_eq!(store.prune_expired(now), 1); // the spent one
        assert_eq!(store.prune_expired(now.plus_secs(300)), 1); // the expired live one
    }

    #[test]
    fn snapshot_round_trip_preserves_state() {
        let store = store();
        let now = Timestamp::new(1000);
        let issued = store.issue(&key(), now);
        store.verify(&key(), &issued.code, now).unwrap();

        let restored =
            ChallengeStore::restore(store.snapshot(), &CoreParams::issuance_defaults());
        assert!(restored.has_verified(&key(), now));
        assert_eq!(restored.spend(&key(), now), Ok(()));
    }
}
