//! # Metadata Pinning
//!
//! Once a submission passes signature verification, its NFT metadata is
//! forwarded to a pinning service that stores it content-addressably and
//! returns a retrievable identifier. The service is an external
//! collaborator: handlers only ever see the [`MetadataPinner`] trait, and
//! its response body is passed back to the client unchanged.
//!
//! The production implementation talks to Pinata's `pinJSONToIPFS`
//! endpoint, wrapping the metadata in the envelope Pinata expects:
//! `{"pinataMetadata":{"name":<uuid>},"pinataContent":<nft>}` with the
//! API key pair in custom headers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::AppConfig;

/// NFT metadata as submitted by the client. All three fields are
/// required; `attributes` is passed through opaquely (wallet UIs disagree
/// on its shape and we don't referee).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NftMetadata {
    pub name: String,
    pub description: String,
    pub attributes: Value,
}

/// The raw, not-yet-validated form of [`NftMetadata`] straight out of the
/// request body. Any field may be absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NftMetadataDraft {
    pub name: Option<String>,
    pub description: Option<String>,
    pub attributes: Option<Value>,
}

impl NftMetadataDraft {
    /// Promotes the draft to validated metadata, or `None` if any field
    /// is missing. Empty strings count as missing — a nameless NFT helps
    /// nobody.
    pub fn complete(self) -> Option<NftMetadata> {
        let name = self.name.filter(|s| !s.is_empty())?;
        let description = self.description.filter(|s| !s.is_empty())?;
        let attributes = self.attributes?;
        Some(NftMetadata {
            name,
            description,
            attributes,
        })
    }
}

/// Errors from the pinning collaborator. All of them surface to the
/// client as the same generic rejection.
#[derive(Debug, Error)]
pub enum PinningError {
    #[error("pinning request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("pinning service rejected the upload: HTTP {0}")]
    Rejected(u16),
}

/// The pinning capability. `name` becomes the pin's label on the service;
/// the returned value is the service's response body, forwarded verbatim.
#[async_trait]
pub trait MetadataPinner: Send + Sync {
    async fn pin_metadata(&self, name: &str, nft: &NftMetadata) -> Result<Value, PinningError>;
}

/// Pinata-backed implementation of [`MetadataPinner`].
pub struct PinataClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    secret_key: String,
}

impl PinataClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: config.pinata_endpoint.clone(),
            api_key: config.pinata_api_key.clone(),
            secret_key: config.pinata_secret_key.clone(),
        }
    }
}

#[async_trait]
impl MetadataPinner for PinataClient {
    async fn pin_metadata(&self, name: &str, nft: &NftMetadata) -> Result<Value, PinningError> {
        let body = json!({
            "pinataMetadata": { "name": name },
            "pinataContent": nft,
        });

        let response = self
            .http
            .post(&self.endpoint)
            .header("pinata_api_key", &self.api_key)
            .header("pinata_secret_api_key", &self.secret_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "pinning service rejected upload");
            return Err(PinningError::Rejected(status.as_u16()));
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_draft() -> NftMetadataDraft {
        NftMetadataDraft {
            name: Some("Sunset #7".to_string()),
            description: Some("One of one".to_string()),
            attributes: Some(json!([{"trait_type": "mood", "value": "calm"}])),
        }
    }

    #[test]
    fn test_complete_draft_promotes() {
        let nft = full_draft().complete().unwrap();
        assert_eq!(nft.name, "Sunset #7");
        assert_eq!(nft.description, "One of one");
    }

    #[test]
    fn test_missing_fields_fail_validation() {
        let mut missing_name = full_draft();
        missing_name.name = None;
        assert!(missing_name.complete().is_none());

        let mut missing_description = full_draft();
        missing_description.description = None;
        assert!(missing_description.complete().is_none());

        let mut missing_attributes = full_draft();
        missing_attributes.attributes = None;
        assert!(missing_attributes.complete().is_none());
    }

    #[test]
    fn test_empty_strings_count_as_missing() {
        let mut draft = full_draft();
        draft.name = Some(String::new());
        assert!(draft.complete().is_none());
    }

    #[test]
    fn test_empty_attributes_array_is_allowed() {
        // "attributes": [] is present, just empty. That's fine.
        let mut draft = full_draft();
        draft.attributes = Some(json!([]));
        assert!(draft.complete().is_some());
    }

    #[tokio::test]
    async fn test_pinata_client_rejection_maps_to_error() {
        // Point the client at a port nothing listens on: the transport
        // error must come back as PinningError, not a panic.
        let mut config = AppConfig::for_tests("0xabc");
        config.pinata_endpoint = "http://127.0.0.1:1/pinning/pinJSONToIPFS".to_string();
        let client = PinataClient::new(&config);

        let nft = full_draft().complete().unwrap();
        let result = client.pin_metadata("label", &nft).await;
        assert!(matches!(result, Err(PinningError::Transport(_))));
    }
}
