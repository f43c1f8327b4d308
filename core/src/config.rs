//! # Configuration & Constants
//!
//! Every fixed protocol value in Mintgate lives here, next to the
//! [`AppConfig`] struct that carries the deployment-specific pieces.
//!
//! The configuration is read from the process environment exactly once, at
//! startup, via [`AppConfig::from_env`]. After that it travels by `Arc`
//! into whoever needs it. Core logic never calls `std::env` — that keeps
//! the verifier and the challenge generator pure and testable.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Protocol Constants
// ---------------------------------------------------------------------------

/// Name of the session cookie carrying the sealed challenge between the
/// GET and POST legs of one verification flow.
pub const SESSION_COOKIE_NAME: &str = "nft-auth-session";

/// Fixed session key under which the outstanding challenge is stored.
/// A session holds at most one challenge at a time; the next GET
/// overwrites it.
pub const CHALLENGE_SESSION_KEY: &str = "message-session";

/// The `personal_sign` prefix. Wallets prepend this plus the message's
/// decimal byte length before hashing, so signed application data can
/// never be confused with a signed transaction.
pub const PERSONAL_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// Recoverable ECDSA signature length: 32-byte r, 32-byte s, 1-byte v.
pub const SIGNATURE_LENGTH: usize = 65;

/// Ethereum address length in bytes (the low 20 bytes of the Keccak-256
/// hash of the uncompressed public key).
pub const ADDRESS_LENGTH: usize = 20;

/// How long an issued challenge stays valid, in seconds. The original
/// flow never expired challenges; 10 minutes closes the replay window
/// without bothering anyone who signs promptly.
pub const DEFAULT_CHALLENGE_TTL_SECS: i64 = 600;

/// Default Pinata pinning endpoint.
pub const DEFAULT_PINATA_ENDPOINT: &str = "https://api.pinata.cloud/pinning/pinJSONToIPFS";

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

/// Errors while assembling the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {var}: {reason}")]
    InvalidVar { var: &'static str, reason: String },
}

/// Deployment configuration, constructed once at process start.
///
/// Cheap to clone; handlers receive it behind an `Arc` anyway.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address of the NFT market contract challenges are bound to.
    pub contract_address: String,
    /// Secret used to seal the session cookie. Anything goes length-wise;
    /// the session layer derives a 256-bit key from it with Keccak-256.
    pub cookie_password: String,
    /// Pinata API key, sent as the `pinata_api_key` header.
    pub pinata_api_key: String,
    /// Pinata API secret, sent as the `pinata_secret_api_key` header.
    pub pinata_secret_key: String,
    /// Pinning endpoint. Overridable so tests can point at a local mock.
    pub pinata_endpoint: String,
    /// Whether to mark the session cookie `Secure`. On in production.
    pub secure_cookies: bool,
    /// Maximum age of an issued challenge before it stops verifying.
    pub challenge_ttl_secs: i64,
}

impl AppConfig {
    /// Builds the configuration from the process environment.
    ///
    /// Required: `NFT_CONTRACT_ADDRESS`, `SECRET_COOKIE_PASSWORD`,
    /// `PINATA_API_KEY`, `PINATA_SECRET_KEY`.
    ///
    /// Optional: `PINATA_ENDPOINT`, `MINTGATE_SECURE_COOKIES`
    /// (default: on unless set to `0`/`false`), `MINTGATE_CHALLENGE_TTL`
    /// (seconds).
    pub fn from_env() -> Result<Self, ConfigError> {
        fn required(var: &'static str) -> Result<String, ConfigError> {
            std::env::var(var).map_err(|_| ConfigError::MissingVar(var))
        }

        let challenge_ttl_secs = match std::env::var("MINTGATE_CHALLENGE_TTL") {
            Ok(raw) => raw.parse::<i64>().map_err(|e| ConfigError::InvalidVar {
                var: "MINTGATE_CHALLENGE_TTL",
                reason: e.to_string(),
            })?,
            Err(_) => DEFAULT_CHALLENGE_TTL_SECS,
        };

        let secure_cookies = match std::env::var("MINTGATE_SECURE_COOKIES") {
            Ok(raw) => !matches!(raw.to_lowercase().as_str(), "0" | "false" | "off"),
            Err(_) => true,
        };

        Ok(Self {
            contract_address: required("NFT_CONTRACT_ADDRESS")?,
            cookie_password: required("SECRET_COOKIE_PASSWORD")?,
            pinata_api_key: required("PINATA_API_KEY")?,
            pinata_secret_key: required("PINATA_SECRET_KEY")?,
            pinata_endpoint: std::env::var("PINATA_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_PINATA_ENDPOINT.to_string()),
            secure_cookies,
            challenge_ttl_secs,
        })
    }

    /// A configuration suitable for tests: local-only values, no secure
    /// flag, generous TTL.
    pub fn for_tests(contract_address: &str) -> Self {
        Self {
            contract_address: contract_address.to_string(),
            cookie_password: "correct horse battery staple".to_string(),
            pinata_api_key: "test-key".to_string(),
            pinata_secret_key: "test-secret".to_string(),
            pinata_endpoint: DEFAULT_PINATA_ENDPOINT.to_string(),
            secure_cookies: false,
            challenge_ttl_secs: DEFAULT_CHALLENGE_TTL_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_sanity() {
        assert_eq!(SIGNATURE_LENGTH, 65);
        assert_eq!(ADDRESS_LENGTH, 20);
        // The prefix must start with 0x19 so it can never be valid RLP,
        // which is the whole point of the convention.
        assert_eq!(PERSONAL_MESSAGE_PREFIX.as_bytes()[0], 0x19);
        assert!(DEFAULT_CHALLENGE_TTL_SECS > 0);
    }

    #[test]
    fn test_for_tests_config_is_insecure() {
        let cfg = AppConfig::for_tests("0xabc");
        assert_eq!(cfg.contract_address, "0xabc");
        assert!(!cfg.secure_cookies);
    }
}
