//! # Keccak-256 & the personal-sign prefix
//!
//! Ethereum hashes with the original Keccak-256, not the finalized
//! SHA3-256 (the padding differs), so make sure any test vector you reach
//! for comes from the Ethereum world.
//!
//! The second half of this module is the `personal_sign` convention:
//! before hashing, the wallet prepends `"\x19Ethereum Signed Message:\n"`
//! plus the message's byte length as a decimal string. The 0x19 lead byte
//! can never start valid RLP, so a signature over prefixed data can never
//! double as a signature over a transaction.

use tiny_keccak::{Hasher, Keccak};

use crate::config::PERSONAL_MESSAGE_PREFIX;

/// Compute the Keccak-256 hash of the input data.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}

/// Hash a message per the `personal_sign` convention.
///
/// Builds `prefix ‖ decimal(len(message)) ‖ message` and Keccak-256 hashes
/// the whole thing. This must match what the wallet hashed byte for byte,
/// or recovery yields a perfectly valid — and perfectly wrong — address.
pub fn personal_message_hash(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(PERSONAL_MESSAGE_PREFIX.as_bytes());
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    hasher.finalize(&mut output);
    output
}

/// Render a 20-byte address with its EIP-55 mixed-case checksum.
///
/// The case of each hex letter encodes one bit of the Keccak-256 hash of
/// the lowercase address, which lets clients catch typos without any
/// extra field. We store and compare addresses case-insensitively; this
/// is only for display.
pub fn checksum_address(address: &[u8; 20]) -> String {
    let lower = hex::encode(address);
    let digest = keccak256(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = (digest[i / 2] >> (4 * (1 - i % 2))) & 0x0f;
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}
