use serde::Serialize;

use crate::api::v1::extractors::AuthCtx;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub remote_user: String,
    pub authorization_type: String,
    pub client_id: String,
}

impl From<AuthCtx> for MeResponse {
    fn from(ctx: AuthCtx) -> Self {
        Self {
            remote_user: ctx.remote_user,
            authorization_type: ctx.authorization_type,
            client_id: ctx.client_id,
        }
    }
}
