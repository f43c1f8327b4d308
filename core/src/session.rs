//! # Sessions
//!
//! The session is the only state the verification flow keeps between
//! requests, and it is client-held: a string-keyed JSON map sealed into an
//! encrypted cookie. The server stores nothing, which means no session
//! database, no expiry sweeps, and no cross-client shared mutable state —
//! the cookie mechanism itself provides the per-client scoping.
//!
//! ## Sealing
//!
//! `seal()` serializes the map to JSON and encrypts it with AES-256-GCM
//! under a key derived from the configured cookie password
//! (Keccak-256 of the password bytes). The cookie value is
//! `hex(nonce ‖ ciphertext)` — 12 random nonce bytes in front, GCM tag at
//! the end. GCM is unforgiving about nonce reuse, so every seal draws a
//! fresh nonce from the OS RNG.
//!
//! ## Opening
//!
//! A cookie that fails to decrypt — tampered, truncated, sealed under a
//! different password — opens to an *empty* session rather than an error.
//! An empty session holds no challenge, so verification fails with the
//! same generic rejection as any other bad submission. Tampering is not
//! a distinguishable outcome.

use std::collections::HashMap;

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use serde_json::Value;
use thiserror::Error;

use crate::crypto::hash::keccak256;

/// AES-GCM nonce length in bytes. 96 bits, the standard and only size
/// you should use with GCM.
const NONCE_LENGTH: usize = 12;

/// Errors while persisting a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to seal session")]
    SealFailed,
}

/// The session capability handed to the orchestrator: an opaque
/// key/value map with get/set semantics. Persistence is the
/// implementation's business — an encrypted cookie in production, a plain
/// map in tests.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<&Value>;
    fn set(&mut self, key: &str, value: Value);
    fn remove(&mut self, key: &str) -> Option<Value>;
}

// ---------------------------------------------------------------------------
// Cookie-backed session
// ---------------------------------------------------------------------------

/// A session backed by an encrypted cookie.
#[derive(Debug, Default, Clone)]
pub struct CookieSession {
    entries: HashMap<String, Value>,
}

impl CookieSession {
    /// Opens a session from an optional sealed cookie value.
    ///
    /// `None`, or any value that fails hex decoding, decryption, or JSON
    /// parsing, yields an empty session. The distinction is logged at
    /// debug level and goes no further.
    pub fn open(password: &str, sealed: Option<&str>) -> Self {
        let Some(sealed) = sealed else {
            return Self::default();
        };

        match Self::unseal(password, sealed) {
            Some(entries) => Self { entries },
            None => {
                tracing::debug!("session cookie failed to open, starting empty");
                Self::default()
            }
        }
    }

    fn unseal(password: &str, sealed: &str) -> Option<HashMap<String, Value>> {
        let data = hex::decode(sealed).ok()?;
        if data.len() < NONCE_LENGTH {
            return None;
        }

        let (nonce_bytes, ciphertext) = data.split_at(NONCE_LENGTH);
        let cipher = Aes256Gcm::new_from_slice(&derive_key(password)).ok()?;
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .ok()?;

        serde_json::from_slice(&plaintext).ok()
    }

    /// Seals the session into a cookie value: `hex(nonce ‖ ciphertext)`.
    pub fn seal(&self, password: &str) -> Result<String, SessionError> {
        let plaintext =
            serde_json::to_vec(&self.entries).map_err(|_| SessionError::SealFailed)?;

        let cipher =
            Aes256Gcm::new_from_slice(&derive_key(password)).map_err(|_| SessionError::SealFailed)?;

        let mut nonce_bytes = [0u8; NONCE_LENGTH];
        rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_slice())
            .map_err(|_| SessionError::SealFailed)?;

        let mut out = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(hex::encode(out))
    }
}

impl SessionStore for CookieSession {
    fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    fn set(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }
}

/// Derive the 256-bit sealing key from the cookie password.
/// Keccak-256 because it's already in the dependency tree; any
/// fixed-output-length cryptographic hash would do here.
fn derive_key(password: &str) -> [u8; 32] {
    keccak256(password.as_bytes())
}

// ---------------------------------------------------------------------------
// In-memory session (tests, and anything that doesn't speak HTTP)
// ---------------------------------------------------------------------------

/// A plain in-memory session. Satisfies [`SessionStore`] without any
/// sealing — the fake the orchestrator tests run against.
#[derive(Debug, Default, Clone)]
pub struct MemorySession {
    entries: HashMap<String, Value>,
}

impl SessionStore for MemorySession {
    fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    fn set(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }
}
