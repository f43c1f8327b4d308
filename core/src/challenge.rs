//! # Challenges
//!
//! A challenge is the one-time payload a wallet must sign to prove it
//! controls a private key: the marketplace contract address plus a random
//! UUID. The UUID is what makes the challenge unguessable — two concurrent
//! clients must never receive the same one, so it's a 122-bit random
//! identifier, not a counter.
//!
//! ## Canonical encoding
//!
//! The client signs the challenge's JSON serialization *byte for byte*.
//! `{"contractAddress":"…","id":"…"}` — this exact field order, no
//! whitespace. Change a single byte and the signed hash changes, so the
//! struct below is the single source of truth for that encoding on both
//! the issue and verify paths.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A one-time challenge bound to a contract address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    /// Address of the contract the client is expected to act against.
    pub contract_address: String,
    /// Random unique token, UUID v4 in textual form.
    pub id: String,
}

impl Challenge {
    /// Mints a fresh challenge for the given contract address.
    ///
    /// Pure function of its input plus the CSPRNG behind `Uuid::new_v4`.
    /// Persisting the result is the caller's job.
    pub fn generate(contract_address: &str) -> Self {
        Self {
            contract_address: contract_address.to_string(),
            id: Uuid::new_v4().to_string(),
        }
    }

    /// The canonical byte encoding the wallet signs.
    ///
    /// `serde_json` emits struct fields in declaration order with no
    /// whitespace, which reproduces `JSON.stringify({contractAddress, id})`
    /// exactly. Serializing a two-string struct cannot fail.
    pub fn canonical_encoding(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("challenge serialization is infallible")
    }
}

/// A challenge as stored in the session: the signed payload plus its
/// issuance timestamp. The timestamp is deliberately *outside*
/// [`Challenge`] so it never leaks into the canonical encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChallenge {
    #[serde(flatten)]
    pub challenge: Challenge,
    pub issued_at: DateTime<Utc>,
}

impl StoredChallenge {
    /// Wraps a freshly generated challenge with the current time.
    pub fn issue(challenge: Challenge) -> Self {
        Self {
            challenge,
            issued_at: Utc::now(),
        }
    }

    /// Whether the challenge is older than `ttl_secs`.
    pub fn is_expired(&self, ttl_secs: i64) -> bool {
        Utc::now().signed_duration_since(self.issued_at).num_seconds() > ttl_secs
    }
}

/// The client's answer to a challenge: the address it claims signed, and
/// the hex-encoded recoverable signature. Purely transient request data.
#[derive(Debug, Clone, Deserialize)]
pub struct SignatureSubmission {
    pub address: String,
    pub signature: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_canonical_encoding_is_byte_exact() {
        let challenge = Challenge {
            contract_address: "0xabc".to_string(),
            id: "3fae0a93-7a4c-4c94-8a2f-0f0e8c1d2b3a".to_string(),
        };
        assert_eq!(
            challenge.canonical_encoding(),
            br#"{"contractAddress":"0xabc","id":"3fae0a93-7a4c-4c94-8a2f-0f0e8c1d2b3a"}"#
        );
    }

    #[test]
    fn test_generated_ids_are_unique() {
        // 10,000 challenges for the same contract, 10,000 distinct ids.
        // If this collides, the RNG is broken and we have bigger problems.
        let ids: HashSet<String> = (0..10_000)
            .map(|_| Challenge::generate("0xabc").id)
            .collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_generate_binds_contract_address() {
        let challenge = Challenge::generate("0xDEADbeef");
        assert_eq!(challenge.contract_address, "0xDEADbeef");
        // UUID v4 textual form: 36 chars with hyphens.
        assert_eq!(challenge.id.len(), 36);
    }

    #[test]
    fn test_stored_challenge_roundtrips_through_json() {
        // The session serializes StoredChallenge; the flattened layout must
        // come back intact, and the inner challenge's encoding must not be
        // affected by the extra timestamp field.
        let stored = StoredChallenge::issue(Challenge::generate("0xabc"));
        let json = serde_json::to_value(&stored).unwrap();
        assert!(json.get("contractAddress").is_some());
        assert!(json.get("issued_at").is_some());

        let back: StoredChallenge = serde_json::from_value(json).unwrap();
        assert_eq!(back.challenge, stored.challenge);
    }

    #[test]
    fn test_expiry_window() {
        let mut stored = StoredChallenge::issue(Challenge::generate("0xabc"));
        assert!(!stored.is_expired(600));

        stored.issued_at = Utc::now() - chrono::Duration::seconds(601);
        assert!(stored.is_expired(600));
    }
}
