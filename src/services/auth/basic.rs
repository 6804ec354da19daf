//! Basic stage of the combined check.
//!
//! The validator trait is the seam; `ClientSecretValidator` is the table-backed
//! implementation wired in by the binary. On success it records `client_id`
//! on the request, which the Bearer stage later matches the token audience
//! against.

use std::collections::HashMap;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::services::auth::request::{AuthRequest, CLIENT_ID};

const BASIC_PREFIX: &str = "Basic ";

#[async_trait]
pub trait BasicValidator: Send + Sync {
    async fn validate(&self, request: &mut dyn AuthRequest) -> bool;
}

/// `Basic <base64(id:secret)>` credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub client_id: String,
    pub secret: String,
}

impl BasicCredentials {
    /// Parse the Basic scheme out of an `Authorization` value.
    ///
    /// Only the first comma-separated part is looked at, so a combined
    /// `Basic ..., Bearer ...` value works as well as a plain one.
    pub fn parse(authorization: &str) -> Option<Self> {
        let first = authorization.split(',').next()?.trim();
        let encoded = first.strip_prefix(BASIC_PREFIX)?.trim();

        let decoded = STANDARD.decode(encoded).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (client_id, secret) = decoded.split_once(':')?;

        if client_id.is_empty() {
            return None;
        }

        Some(Self {
            client_id: client_id.to_string(),
            secret: secret.to_string(),
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClientEntryError {
    #[error("expected `<client_id>:<sha256 hex>`")]
    Shape,
    #[error("secret digest is not 32 bytes of hex")]
    Digest,
}

/// One registered client: its id and the SHA-256 digest of its secret.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicClient {
    pub client_id: String,
    secret_sha256: [u8; 32],
}

impl std::fmt::Debug for BasicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicClient")
            .field("client_id", &self.client_id)
            .finish()
    }
}

impl BasicClient {
    #[cfg(test)]
    pub fn from_secret(client_id: impl Into<String>, secret: &str) -> Self {
        Self {
            client_id: client_id.into(),
            secret_sha256: digest(secret),
        }
    }

    /// Parse a `client_id:sha256hex` entry.
    pub fn parse(entry: &str) -> Result<Self, ClientEntryError> {
        let (client_id, hex_digest) = entry.trim().split_once(':').ok_or(ClientEntryError::Shape)?;
        if client_id.is_empty() {
            return Err(ClientEntryError::Shape);
        }

        let bytes = hex::decode(hex_digest.trim()).map_err(|_| ClientEntryError::Digest)?;
        let secret_sha256: [u8; 32] = bytes.try_into().map_err(|_| ClientEntryError::Digest)?;

        Ok(Self {
            client_id: client_id.to_string(),
            secret_sha256,
        })
    }
}

fn digest(secret: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.finalize().into()
}

/// Basic validator over a fixed table of clients.
#[derive(Debug, Clone, Default)]
pub struct ClientSecretValidator {
    clients: HashMap<String, [u8; 32]>,
}

impl ClientSecretValidator {
    pub fn new(clients: impl IntoIterator<Item = BasicClient>) -> Self {
        Self {
            clients: clients
                .into_iter()
                .map(|c| (c.client_id, c.secret_sha256))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    fn check(&self, credentials: &BasicCredentials) -> bool {
        match self.clients.get(&credentials.client_id) {
            // Constant-time comparison.
            Some(expected) => {
                let given = digest(&credentials.secret);
                expected.as_slice().ct_eq(given.as_slice()).into()
            }
            None => false,
        }
    }
}

#[async_trait]
impl BasicValidator for ClientSecretValidator {
    async fn validate(&self, request: &mut dyn AuthRequest) -> bool {
        let Some(credentials) = request
            .header("Authorization")
            .and_then(BasicCredentials::parse)
        else {
            return false;
        };

        if !self.check(&credentials) {
            tracing::debug!(client_id = %credentials.client_id, "basic credentials rejected");
            return false;
        }

        request.set_attribute(CLIENT_ID, credentials.client_id);
        true
    }
}
