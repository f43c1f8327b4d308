// Copyright (c) 2026 Mintgate Labs. MIT License.
// See LICENSE for details.

//! # Mintgate — Core Library
//!
//! The server-side core of the Mintgate NFT marketplace: everything needed
//! to prove that the browser on the other end of an HTTP request actually
//! controls the wallet it claims to control, before we spend money pinning
//! its metadata to IPFS.
//!
//! The flow is a classic challenge/response:
//!
//! 1. The client asks for a challenge (`GET`). We mint a fresh one — the
//!    configured contract address plus a random UUID — and stash it in an
//!    encrypted session cookie.
//! 2. The client signs the challenge's canonical JSON encoding with its
//!    wallet (MetaMask `personal_sign` convention) and sends the signature
//!    back (`POST`) together with the NFT metadata it wants pinned.
//! 3. We recover the signing address from the signature and compare it to
//!    the claimed one. Match ⇒ pin the metadata. Anything else ⇒ one
//!    deliberately uninformative rejection.
//!
//! ## Architecture
//!
//! - **challenge** — Challenge generation and its byte-exact canonical
//!   encoding. The encoding is load-bearing: it is what gets signed.
//! - **crypto** — Keccak-256, the personal-sign prefix, and ECDSA
//!   public-key recovery over secp256k1.
//! - **session** — The `SessionStore` capability and the AES-256-GCM
//!   sealed cookie that backs it in production.
//! - **pinning** — The `MetadataPinner` collaborator and its Pinata
//!   implementation.
//! - **config** — Explicit configuration, built once from the environment.
//!   No ambient lookups inside core logic.
//!
//! ## Design Philosophy
//!
//! 1. The verifier is a pure function of (challenge, submission). No I/O.
//! 2. Rich error taxonomy internally, one generic "no" on the wire.
//! 3. If it gates money, it has tests. Plural.

pub mod challenge;
pub mod config;
pub mod crypto;
pub mod pinning;
pub mod session;

pub use challenge::{Challenge, SignatureSubmission};
pub use config::AppConfig;
pub use crypto::signature::{verify_submission, VerificationError};
pub use pinning::{MetadataPinner, NftMetadata};
pub use session::{MemorySession, SessionStore};
