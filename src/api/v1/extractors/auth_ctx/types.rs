/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - combined gate が RequestAttributes に書いた値から組み立てる
 */

use crate::services::auth::RequestAttributes;
use crate::services::auth::request::{AUTHORIZATION_TYPE, CLIENT_ID, REMOTE_USER};

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `remote_user` は bearer token の `sub`
/// - `client_id` は Basic stage が特定したクライアント (token の `aud` と一致済み)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCtx {
    pub remote_user: String,
    pub authorization_type: String,
    pub client_id: String,
}

impl AuthCtx {
    /// All three attributes must be present; a partial set means the gate
    /// did not run (or did not succeed) for this request.
    pub fn from_attributes(attrs: &RequestAttributes) -> Option<Self> {
        Some(Self {
            remote_user: attrs.get(REMOTE_USER)?.to_string(),
            authorization_type: attrs.get(AUTHORIZATION_TYPE)?.to_string(),
            client_id: attrs.get(CLIENT_ID)?.to_string(),
        })
    }
}
