//! # ECDSA Signature Recovery
//!
//! The hard part of the whole flow. Given the challenge a session was
//! issued and the `(address, signature)` pair the client sent back, decide
//! whether the signature proves possession of the claimed address's
//! private key.
//!
//! There is no address book and no identity lookup anywhere in here —
//! verification is purely self-referential proof-of-possession. Recover
//! the public key from the signature, derive its address, compare.
//!
//! ## Strictness
//!
//! Every failure collapses to a generic rejection at the API boundary.
//! Internally we keep the taxonomy (malformed vs. recovery failure vs.
//! mismatch) for logs, because "why did this legitimate user get bounced"
//! is a question support will ask.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use thiserror::Error;

use crate::challenge::{Challenge, SignatureSubmission};
use crate::config::{ADDRESS_LENGTH, SIGNATURE_LENGTH};
use crate::crypto::hash::{keccak256, personal_message_hash};

/// Errors during signature verification.
///
/// Intentionally vague — the client-facing response never distinguishes
/// these, to avoid handing attackers a signature-validity oracle.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerificationError {
    #[error("malformed signature")]
    MalformedSignature,

    #[error("public key recovery failed")]
    RecoveryFailed,

    #[error("recovered address does not match")]
    AddressMismatch,
}

/// Parse a hex-encoded recoverable signature into its `(r‖s, v)` parts.
///
/// Accepts the standard 65-byte RPC layout with or without a `0x` prefix.
/// The recovery byte is normalized from the Ethereum convention
/// (27/28) down to the raw 0/1 the curve math wants; ids above 3 are
/// rejected outright.
fn parse_rpc_signature(raw: &str) -> Result<(Signature, RecoveryId), VerificationError> {
    let stripped = raw.strip_prefix("0x").unwrap_or(raw);
    let bytes = hex::decode(stripped).map_err(|_| VerificationError::MalformedSignature)?;

    if bytes.len() != SIGNATURE_LENGTH {
        return Err(VerificationError::MalformedSignature);
    }

    let mut v = bytes[SIGNATURE_LENGTH - 1];
    if v >= 27 {
        v -= 27;
    }
    let recovery_id =
        RecoveryId::try_from(v).map_err(|_| VerificationError::MalformedSignature)?;

    let signature = Signature::try_from(&bytes[..SIGNATURE_LENGTH - 1])
        .map_err(|_| VerificationError::MalformedSignature)?;

    Ok((signature, recovery_id))
}

/// Recover the signing address from a 32-byte message hash and a parsed
/// recoverable signature.
///
/// The address is the low 20 bytes of Keccak-256 over the uncompressed
/// public key's X‖Y coordinates (the 0x04 SEC1 tag byte is skipped).
pub fn recover_address(
    message_hash: &[u8; 32],
    signature: &Signature,
    recovery_id: RecoveryId,
) -> Result<[u8; ADDRESS_LENGTH], VerificationError> {
    let verifying_key = VerifyingKey::recover_from_prehash(message_hash, signature, recovery_id)
        .map_err(|_| VerificationError::RecoveryFailed)?;

    let point = verifying_key.to_encoded_point(false);
    let digest = keccak256(&point.as_bytes()[1..]);

    let mut address = [0u8; ADDRESS_LENGTH];
    address.copy_from_slice(&digest[32 - ADDRESS_LENGTH..]);
    Ok(address)
}

/// Verify a submission against the challenge its session was issued.
///
/// Recovers the signer of the challenge's canonical encoding (under the
/// personal-sign convention) and compares it, case-insensitively, to the
/// claimed address. `Ok(())` means the client holds the private key for
/// the address it claims — nothing more.
pub fn verify_submission(
    challenge: &Challenge,
    submission: &SignatureSubmission,
) -> Result<(), VerificationError> {
    let message_hash = personal_message_hash(&challenge.canonical_encoding());
    let (signature, recovery_id) = parse_rpc_signature(&submission.signature)?;
    let recovered = recover_address(&message_hash, &signature, recovery_id)?;

    let recovered_hex = format!("0x{}", hex::encode(recovered));
    if recovered_hex.eq_ignore_ascii_case(submission.address.trim()) {
        Ok(())
    } else {
        Err(VerificationError::AddressMismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::checksum_address;
    use k256::ecdsa::SigningKey;
    use rand::rngs::OsRng;

    /// Signs a challenge the way a wallet would and returns the 65-byte
    /// hex signature plus the signer's lowercase address.
    fn wallet_sign(key: &SigningKey, challenge: &Challenge) -> (String, String) {
        let hash = personal_message_hash(&challenge.canonical_encoding());
        let (signature, recovery_id) = key
            .sign_prehash_recoverable(&hash)
            .expect("signing never fails for a valid key");

        let mut bytes = [0u8; 65];
        bytes[..64].copy_from_slice(&signature.to_bytes());
        // Wallets report v as 27/28; exercise the normalization path.
        bytes[64] = recovery_id.to_byte() + 27;

        let point = key.verifying_key().to_encoded_point(false);
        let digest = keccak256(&point.as_bytes()[1..]);
        let address = format!("0x{}", hex::encode(&digest[12..]));

        (format!("0x{}", hex::encode(bytes)), address)
    }

    #[test]
    fn test_round_trip_verifies() {
        let key = SigningKey::random(&mut OsRng);
        let challenge = Challenge::generate("0xabc");
        let (signature, address) = wallet_sign(&key, &challenge);

        let submission = SignatureSubmission { address, signature };
        assert!(verify_submission(&challenge, &submission).is_ok());
    }

    #[test]
    fn test_checksummed_address_also_verifies() {
        // The comparison is case-insensitive, so the EIP-55 rendering of
        // the same address must pass too.
        let key = SigningKey::random(&mut OsRng);
        let challenge = Challenge::generate("0xabc");
        let (signature, address) = wallet_sign(&key, &challenge);

        let raw: [u8; 20] = hex::decode(&address[2..]).unwrap().try_into().unwrap();
        let submission = SignatureSubmission {
            address: checksum_address(&raw),
            signature,
        };
        assert!(verify_submission(&challenge, &submission).is_ok());
    }

    #[test]
    fn test_any_flipped_byte_fails() {
        let key = SigningKey::random(&mut OsRng);
        let challenge = Challenge::generate("0xabc");
        let (signature, address) = wallet_sign(&key, &challenge);

        let mut bytes = hex::decode(&signature[2..]).unwrap();
        for i in 0..bytes.len() {
            bytes[i] ^= 0x01;
            let tampered = SignatureSubmission {
                address: address.clone(),
                signature: format!("0x{}", hex::encode(&bytes)),
            };
            assert!(
                verify_submission(&challenge, &tampered).is_err(),
                "flipping byte {} slipped through",
                i
            );
            bytes[i] ^= 0x01;
        }
    }

    #[test]
    fn test_unrelated_valid_signature_fails() {
        // A perfectly valid signature over a *different* challenge must not
        // verify — it recovers to the right key but over the wrong bytes,
        // which surfaces as an address mismatch.
        let key = SigningKey::random(&mut OsRng);
        let issued = Challenge::generate("0xabc");
        let other = Challenge::generate("0xabc");
        let (signature, address) = wallet_sign(&key, &other);

        let submission = SignatureSubmission { address, signature };
        assert_eq!(
            verify_submission(&issued, &submission),
            Err(VerificationError::AddressMismatch)
        );
    }

    #[test]
    fn test_wrong_claimed_address_fails() {
        // Signed with K1, claimed K2's address. Generic rejection, no crash.
        let k1 = SigningKey::random(&mut OsRng);
        let k2 = SigningKey::random(&mut OsRng);
        let challenge = Challenge::generate("0xabc");
        let (signature, _) = wallet_sign(&k1, &challenge);
        let (_, k2_address) = wallet_sign(&k2, &challenge);

        let submission = SignatureSubmission {
            address: k2_address,
            signature,
        };
        assert_eq!(
            verify_submission(&challenge, &submission),
            Err(VerificationError::AddressMismatch)
        );
    }

    #[test]
    fn test_malformed_signatures_rejected() {
        let challenge = Challenge::generate("0xabc");
        let cases = [
            "",                           // empty
            "0x",                         // prefix only
            "not hex at all",             // not hex
            "0xdeadbeef",                 // too short
            &("0x".to_string() + &"ab".repeat(66)), // too long
        ];
        for raw in cases {
            let submission = SignatureSubmission {
                address: "0x0000000000000000000000000000000000000000".to_string(),
                signature: raw.to_string(),
            };
            assert_eq!(
                verify_submission(&challenge, &submission),
                Err(VerificationError::MalformedSignature),
                "case {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_invalid_recovery_byte_rejected() {
        let key = SigningKey::random(&mut OsRng);
        let challenge = Challenge::generate("0xabc");
        let (signature, address) = wallet_sign(&key, &challenge);

        let mut bytes = hex::decode(&signature[2..]).unwrap();
        bytes[64] = 99; // not 0/1 and not 27/28
        let submission = SignatureSubmission {
            address,
            signature: format!("0x{}", hex::encode(bytes)),
        };
        assert_eq!(
            verify_submission(&challenge, &submission),
            Err(VerificationError::MalformedSignature)
        );
    }

    #[test]
    fn test_raw_recovery_id_also_accepted() {
        // Some wallets send v as 0/1 instead of 27/28. Both must work.
        let key = SigningKey::random(&mut OsRng);
        let challenge = Challenge::generate("0xabc");
        let (signature, address) = wallet_sign(&key, &challenge);

        let mut bytes = hex::decode(&signature[2..]).unwrap();
        bytes[64] -= 27;
        let submission = SignatureSubmission {
            address,
            signature: format!("0x{}", hex::encode(bytes)),
        };
        assert!(verify_submission(&challenge, &submission).is_ok());
    }

    #[test]
    fn test_unprefixed_hex_accepted() {
        let key = SigningKey::random(&mut OsRng);
        let challenge = Challenge::generate("0xabc");
        let (signature, address) = wallet_sign(&key, &challenge);

        let submission = SignatureSubmission {
            address,
            signature: signature.trim_start_matches("0x").to_string(),
        };
        assert!(verify_submission(&challenge, &submission).is_ok());
    }
}
