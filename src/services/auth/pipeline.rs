//! Combined Basic + Bearer authentication.
//!
//! One `validate` call is an independent four-step decision:
//! disabled -> basic -> header shape -> token claims.
//! Every failure collapses to `false`; nothing here returns an error.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::services::auth::basic::BasicValidator;
use crate::services::auth::request::{
    AUTHORIZATION_TYPE, AuthRequest, CLIENT_ID, PausedRequest, REMOTE_USER,
};
use crate::services::auth::signing::SigningSource;
use crate::services::auth::verifier::{JwtVerifier, TokenVerifier};

pub const BEARER_PREFIX: &str = "Bearer ";
pub const DEFAULT_VERIFY_TIMEOUT: Duration = Duration::from_secs(10);

const AUTHORIZATION: &str = "Authorization";

pub struct AuthPipeline {
    basic: Arc<dyn BasicValidator>,
    // `None` means disabled: no signing key could be resolved.
    verifier: Option<Arc<dyn TokenVerifier>>,
    verify_timeout: Duration,
}

impl std::fmt::Debug for AuthPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthPipeline")
            .field("enabled", &self.is_enabled())
            .field("verify_timeout", &self.verify_timeout)
            .finish()
    }
}

impl AuthPipeline {
    /// Resolve the signing key from `source` and build the JWT verifier.
    ///
    /// A missing or unusable key leaves the pipeline disabled instead of
    /// failing startup.
    pub fn init(
        basic: Arc<dyn BasicValidator>,
        source: &SigningSource,
        verify_timeout: Duration,
    ) -> Self {
        let verifier = match source.resolve() {
            None => {
                tracing::warn!("no signing key configured; combined basic+bearer auth is disabled");
                None
            }
            Some(key) => match JwtVerifier::new(&key) {
                Ok(verifier) => {
                    tracing::info!(
                        algorithm = ?key.algorithm(),
                        "combined basic+bearer auth enabled"
                    );
                    Some(Arc::new(verifier) as Arc<dyn TokenVerifier>)
                }
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        "unusable signing key; combined basic+bearer auth is disabled"
                    );
                    None
                }
            },
        };

        Self::with_verifier(basic, verifier, verify_timeout)
    }

    pub fn with_verifier(
        basic: Arc<dyn BasicValidator>,
        verifier: Option<Arc<dyn TokenVerifier>>,
        verify_timeout: Duration,
    ) -> Self {
        Self {
            basic,
            verifier,
            verify_timeout,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.verifier.is_some()
    }

    /// Cheap pre-check used for dispatch: does this request carry both
    /// schemes at all? It does not validate the header shape.
    pub fn has_basic_and_jwt_header(&self, request: &dyn AuthRequest) -> bool {
        request
            .header(AUTHORIZATION)
            .is_some_and(|v| v.starts_with("Basic ") && v.contains(BEARER_PREFIX))
    }

    /// Run the combined check. Resolves exactly once, to `true` only when
    /// the Basic stage passes and the bearer token is valid for the client
    /// the Basic stage identified.
    ///
    /// On success `remote_user` and `authorization_type` are written to the
    /// request; on failure the request attributes are left untouched.
    pub async fn validate(&self, request: &mut dyn AuthRequest) -> bool {
        let Some(verifier) = self.verifier.as_ref() else {
            return false;
        };

        if !self.basic.validate(request).await {
            return false;
        }

        let Some(token) = request.header(AUTHORIZATION).and_then(bearer_token) else {
            tracing::debug!("authorization header is not a combined basic+bearer value");
            return false;
        };
        let token = token.to_owned();

        let paused = PausedRequest::pause(request);
        let verified =
            tokio::time::timeout(self.verify_timeout, verifier.verify_and_get(&token)).await;
        let request = paused.resume();

        let claims = match verified {
            Ok(Some(claims)) => claims,
            Ok(None) => return false,
            Err(_) => {
                tracing::warn!(
                    timeout = ?self.verify_timeout,
                    "bearer token verification timed out"
                );
                return false;
            }
        };

        let now = Utc::now().timestamp();
        if !claims.accepts(now, request.attribute(CLIENT_ID)) {
            tracing::debug!(sub = %claims.sub, "bearer claims rejected");
            return false;
        }

        request.set_attribute(REMOTE_USER, claims.sub);
        request.set_attribute(AUTHORIZATION_TYPE, "Bearer".to_string());
        true
    }
}

/// Split on a comma followed by any run of whitespace.
fn split_parts(value: &str) -> Vec<&str> {
    value
        .split(',')
        .enumerate()
        .map(|(i, part)| if i == 0 { part } else { part.trim_start() })
        .collect()
}

/// Extract the token from a `<scheme-1>, Bearer <token>` value.
///
/// Exactly two parts are required; extra parts are never scanned.
fn bearer_token(authorization: &str) -> Option<&str> {
    match split_parts(authorization).as_slice() {
        [_, second] => second.strip_prefix(BEARER_PREFIX),
        _ => None,
    }
}
