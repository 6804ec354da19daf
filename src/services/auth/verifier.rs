use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::{DecodingKey, Validation};

use crate::services::auth::claims::TokenClaims;
use crate::services::auth::signing::{SigningKey, SigningKeyError};

/// Bearer token verifier.
///
/// `None` is the only failure signal: bad signature, malformed token and any
/// verifier-internal error all look the same to the caller.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify_and_get(&self, token: &str) -> Option<TokenClaims>;
}

/// JWT signature verifier backed by `jsonwebtoken`.
///
/// Only the signature is checked here. `exp` and `aud` are evaluated by the
/// pipeline, so the library's own checks for them are switched off.
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("JwtVerifier")
            .field("algorithms", &self.validation.algorithms)
            .finish()
    }
}

impl JwtVerifier {
    pub fn new(key: &SigningKey) -> Result<Self, SigningKeyError> {
        let decoding_key = key.decoding_key()?;

        let mut validation = Validation::new(key.algorithm());
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Ok(Self {
            decoding_key: Arc::new(decoding_key),
            validation: Arc::new(validation),
        })
    }

    fn decode(&self, token: &str) -> Result<TokenClaims, jsonwebtoken::errors::Error> {
        let data =
            jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }
}

#[async_trait]
impl TokenVerifier for JwtVerifier {
    async fn verify_and_get(&self, token: &str) -> Option<TokenClaims> {
        let verifier = self.clone();
        let token = token.to_owned();

        // Signature checks are CPU-bound; keep them off the serving threads.
        match tokio::task::spawn_blocking(move || verifier.decode(&token)).await {
            Ok(Ok(claims)) => Some(claims),
            Ok(Err(err)) => {
                tracing::debug!(error = %err, "bearer token rejected");
                None
            }
            Err(err) => {
                tracing::warn!(error = %err, "bearer token verification task failed");
                None
            }
        }
    }
}
