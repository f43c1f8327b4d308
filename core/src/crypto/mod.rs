//! # Cryptographic Primitives for Mintgate
//!
//! Everything security-relevant in the verification flow goes through this
//! module: Keccak-256 hashing, the `personal_sign` message prefix, and
//! ECDSA public-key recovery over secp256k1.
//!
//! We deliberately chose boring, well-audited building blocks:
//!
//! - **Keccak-256** (`tiny-keccak`) — because Ethereum picked pre-NIST
//!   Keccak in 2014 and the ecosystem is stuck with it. Interop trumps taste.
//! - **secp256k1 recovery** (`k256`) — the pure-Rust RustCrypto
//!   implementation; no C bindings, no linking surprises.
//!
//! ## A note on "rolling your own crypto"
//!
//! We don't. This module is a thin, type-safe assembly of audited pieces.
//! The only bespoke logic is byte plumbing — prefixes, splits, and hex —
//! and all of it is pinned down by tests.

pub mod hash;
pub mod signature;

pub use hash::{checksum_address, keccak256, personal_message_hash};
pub use signature::{recover_address, verify_submission, VerificationError};
