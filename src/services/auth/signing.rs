//! Signing key resolution.
//!
//! The key comes from a process-wide settings map under a well-known name.
//! It is resolved once when the pipeline is built and never mutated after.

use std::collections::HashMap;
use std::fmt;

use jsonwebtoken::{Algorithm, DecodingKey};
use thiserror::Error;

pub const SIGN_KEY_NAME: &str = "signKey";

const PEM_PREFIX: &str = "-----BEGIN";

/// Shared settings map the signing key is read from.
#[derive(Clone, Default)]
pub struct SigningSource {
    entries: HashMap<String, String>,
}

impl fmt::Debug for SigningSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Values may be secrets; only list the names.
        f.debug_struct("SigningSource")
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SigningSource {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_sign_key(material: impl Into<String>) -> Self {
        let mut source = Self::new();
        source.insert(SIGN_KEY_NAME, material);
        source
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(name.into(), value.into());
    }

    pub fn resolve(&self) -> Option<SigningKey> {
        self.entries
            .get(SIGN_KEY_NAME)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(SigningKey::new)
    }
}

#[derive(Debug, Error)]
pub enum SigningKeyError {
    #[error("invalid rsa public key pem: {0}")]
    InvalidPem(#[source] jsonwebtoken::errors::Error),
}

/// Immutable key material used to check bearer token signatures.
///
/// PEM material is treated as an RSA public key (RS256), anything else as an
/// HMAC shared secret (HS256).
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey {
    material: String,
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("SigningKey")
            .field("algorithm", &self.algorithm())
            .finish()
    }
}

impl SigningKey {
    pub fn new(material: impl Into<String>) -> Self {
        Self {
            material: material.into(),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        if self.material.starts_with(PEM_PREFIX) {
            Algorithm::RS256
        } else {
            Algorithm::HS256
        }
    }

    pub fn decoding_key(&self) -> Result<DecodingKey, SigningKeyError> {
        match self.algorithm() {
            Algorithm::RS256 => DecodingKey::from_rsa_pem(self.material.as_bytes())
                .map_err(SigningKeyError::InvalidPem),
            _ => Ok(DecodingKey::from_secret(self.material.as_bytes())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_under_the_well_known_name() {
        let source = SigningSource::with_sign_key("s3cret");
        let key = source.resolve().unwrap();
        assert_eq!(key.algorithm(), Algorithm::HS256);
    }

    #[test]
    fn absent_or_blank_key_resolves_to_none() {
        assert!(SigningSource::new().resolve().is_none());
        assert!(SigningSource::with_sign_key("   ").resolve().is_none());

        let mut other = SigningSource::new();
        other.insert("otherKey", "value");
        assert!(other.resolve().is_none());
    }

    #[test]
    fn pem_material_selects_rs256() {
        let key = SigningKey::new("-----BEGIN PUBLIC KEY-----\nnope\n-----END PUBLIC KEY-----");
        assert_eq!(key.algorithm(), Algorithm::RS256);
        assert!(key.decoding_key().is_err());
    }

    #[test]
    fn debug_hides_material() {
        let key = SigningKey::new("super-secret");
        assert!(!format!("{key:?}").contains("super-secret"));

        let source = SigningSource::with_sign_key("super-secret");
        assert!(!format!("{source:?}").contains("super-secret"));
    }
}
