//! Credential lifecycle: mint, verify, revoke, rotate.

use crate::error::CredentialError;
use crate::sign;
use praman_store::{CredentialRecord, CredentialStore};
use praman_types::{CoreParams, Timestamp};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::Serialize;
use std::sync::{Arc, Mutex};

/// Returned once from `mint` and `rotate`. The plaintext secret is not
/// recoverable afterwards.
#[derive(Clone, Debug, Serialize)]
pub struct MintedCredential {
    pub consumer: String,
    pub api_key: String,
    pub secret: String,
}

/// Credential service over any credential store.
///
/// Minting takes an internal lock so two concurrent mints for the same
/// consumer name cannot both pass the duplicate check.
pub struct CredentialService<S> {
    store: Arc<S>,
    skew_secs: u64,
    mint_lock: Mutex<()>,
}

impl<S: CredentialStore> CredentialService<S> {
    pub fn new(store: Arc<S>, params: &CoreParams) -> Self {
        Self {
            store,
            skew_secs: params.signature_skew_secs,
            mint_lock: Mutex::new(()),
        }
    }

    /// Mint a credential for a consumer. Names are case-normalized, so
    /// "Acme" and "acme" are the same consumer.
    pub fn mint(&self, consumer: &str, now: Timestamp) -> Result<MintedCredential, CredentialError> {
        let _guard = self.mint_lock.lock().unwrap();
        let consumer = normalize(consumer);
        if self.store.get_active_credential(&consumer)?.is_some() {
            return Err(CredentialError::DuplicateConsumer(consumer));
        }
        self.mint_locked(consumer, now)
    }

    /// Verify a signed request and return the consumer name it belongs to.
    ///
    /// Checks run cheapest-first: key lookup, then timestamp freshness,
    /// then the HMAC itself.
    pub fn verify_request(
        &self,
        api_key: &str,
        timestamp: u64,
        signature_hex: &str,
        body: &[u8],
        now: Timestamp,
    ) -> Result<String, CredentialError> {
        let record = self
            .store
            .get_credential_by_key(api_key)?
            .filter(|r| !r.revoked)
            .ok_or(CredentialError::UnknownKey)?;

        if now.abs_diff(Timestamp::new(timestamp)) > self.skew_secs {
            return Err(CredentialError::StaleRequest);
        }

        let key = hex::decode(&record.secret_digest)
            .map_err(|_| CredentialError::BadSignature)?;
        if !sign::verify_signature(&key, timestamp, body, signature_hex) {
            tracing::warn!(consumer = %record.consumer, "bad request signature");
            return Err(CredentialError::BadSignature);
        }
        Ok(record.consumer)
    }

    /// Revoke a consumer's active credential.
    pub fn revoke(&self, consumer: &str) -> Result<(), CredentialError> {
        let _guard = self.mint_lock.lock().unwrap();
        let consumer = normalize(consumer);
        let mut record = self
            .store
            .get_active_credential(&consumer)?
            .ok_or_else(|| CredentialError::UnknownConsumer(consumer.clone()))?;
        record.revoked = true;
        self.store.put_credential(&record)?;
        tracing::info!(consumer = %consumer, "credential revoked");
        Ok(())
    }

    /// Revoke the active credential and mint a replacement in one step.
    pub fn rotate(
        &self,
        consumer: &str,
        now: Timestamp,
    ) -> Result<MintedCredential, CredentialError> {
        let _guard = self.mint_lock.lock().unwrap();
        let consumer = normalize(consumer);
        let mut record = self
            .store
            .get_active_credential(&consumer)?
            .ok_or_else(|| CredentialError::UnknownConsumer(consumer.clone()))?;
        record.revoked = true;
        self.store.put_credential(&record)?;
        self.mint_locked(consumer, now)
    }

    fn mint_locked(
        &self,
        consumer: String,
        now: Timestamp,
    ) -> Result<MintedCredential, CredentialError> {
        let api_key = format!("api_{}", random_hex(16));
        let secret = format!("sec_{}", random_hex(24));
        self.store.put_credential(&CredentialRecord {
            consumer: consumer.clone(),
            api_key: api_key.clone(),
            secret_digest: sign::secret_digest(&secret),
            created_at: now,
            revoked: false,
        })?;
        tracing::info!(consumer = %consumer, "credential minted");
        Ok(MintedCredential {
            consumer,
            api_key,
            secret,
        })
    }
}

fn normalize(consumer: &str) -> String {
    consumer.trim().to_lowercase()
}

fn random_hex(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sign::derive_signing_key;
    use praman_store_memory::MemoryStore;

    fn service() -> CredentialService<MemoryStore> {
        CredentialService::new(
            Arc::new(MemoryStore::new()),
            &CoreParams::issuance_defaults(),
        )
    }

    fn sign(minted: &MintedCredential, timestamp: u64, body: &[u8]) -> String {
        sign::sign_request(&derive_signing_key(&minted.secret), timestamp, body)
    }

    #[test]
    fn mint_shapes_and_duplicate_rejection() {
        let service = service();
        let now = Timestamp::new(1000);
        let minted = service.mint("Acme Lending", now).unwrap();
        assert_eq!(minted.consumer, "acme lending");
        assert!(minted.api_key.starts_with("api_"));
        assert_eq!(minted.api_key.len(), 4 + 32);
        assert!(minted.secret.starts_with("sec_"));
        assert_eq!(minted.secret.len(), 4 + 48);

        // Case-insensitive duplicate.
        let dup = service.mint("ACME LENDING", now);
        assert!(matches!(dup, Err(CredentialError::DuplicateConsumer(_))));
    }

    #[test]
    fn signed_request_verifies_and_returns_consumer() {
        let service = service();
        let now = Timestamp::new(1_700_000_000);
        let minted = service.mint("acme", now).unwrap();

        let body = br#"{"entity_id":"27ABCDE1234F1Z5"}"#;
        let sig = sign(&minted, 1_700_000_000, body);
        let consumer = service
            .verify_request(&minted.api_key, 1_700_000_000, &sig, body, now)
            .unwrap();
        assert_eq!(consumer, "acme");
    }

    #[test]
    fn flipped_body_byte_fails_bad_signature() {
        let service = service();
        let now = Timestamp::new(1_700_000_000);
        let minted = service.mint("acme", now).unwrap();

        let sig = sign(&minted, 1_700_000_000, b"payload");
        let result = service.verify_request(&minted.api_key, 1_700_000_000, &sig, b"paylOad", now);
        assert!(matches!(result, Err(CredentialError::BadSignature)));
    }

    #[test]
    fn ten_minute_old_timestamp_fails_stale() {
        let service = service();
        let now = Timestamp::new(1_700_000_600);
        let minted = service.mint("acme", Timestamp::new(1_700_000_000)).unwrap();

        let ts = 1_700_000_000; // 600s in the past, window is 300s
        let sig = sign(&minted, ts, b"body");
        let result = service.verify_request(&minted.api_key, ts, &sig, b"body", now);
        assert!(matches!(result, Err(CredentialError::StaleRequest)));
    }

    #[test]
    fn future_timestamp_within_skew_is_accepted() {
        let service = service();
        let now = Timestamp::new(1_700_000_000);
        let minted = service.mint("acme", now).unwrap();

        let ts = 1_700_000_200; // 200s ahead, inside the window
        let sig = sign(&minted, ts, b"body");
        assert!(service
            .verify_request(&minted.api_key, ts, &sig, b"body", now)
            .is_ok());
    }

    #[test]
    fn revoked_key_fails_unknown_key() {
        let service = service();
        let now = Timestamp::new(1_700_000_000);
        let minted = service.mint("acme", now).unwrap();
        service.revoke("acme").unwrap();

        let sig = sign(&minted, 1_700_000_000, b"body");
        let result = service.verify_request(&minted.api_key, 1_700_000_000, &sig, b"body", now);
        assert!(matches!(result, Err(CredentialError::UnknownKey)));
    }

    #[test]
    fn rotate_invalidates_old_key_and_mints_new() {
        let service = service();
        let now = Timestamp::new(1_700_000_000);
        let old = service.mint("acme", now).unwrap();
        let new = service.rotate("acme", now).unwrap();
        assert_ne!(old.api_key, new.api_key);

        let sig = sign(&old, 1_700_000_000, b"body");
        assert!(matches!(
            service.verify_request(&old.api_key, 1_700_000_000, &sig, b"body", now),
            Err(CredentialError::UnknownKey)
        ));

        let sig = sign(&new, 1_700_000_000, b"body");
        assert!(service
            .verify_request(&new.api_key, 1_700_000_000, &sig, b"body", now)
            .is_ok());
    }

    #[test]
    fn mint_after_revoke_is_allowed() {
        let service = service();
        let now = Timestamp::new(1000);
        service.mint("acme", now).unwrap();
        service.revoke("acme").unwrap();
        assert!(service.mint("acme", now).is_ok());
    }
}
