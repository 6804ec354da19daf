use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::services::auth::RequestAttributes;
use crate::state::AppState;

use super::AuthCtx;

/// Handler で、 AuthCtx を受け取るための extractor
/// combined gate が RequestAttributes を request.extensions() に書いた前提
/// 見つからない場合は 401 を返す（gate 未設定・認証未完了）
pub struct AuthCtxExtractor(pub AuthCtx);

impl FromRequestParts<AppState> for AuthCtxExtractor
where
    AppState: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestAttributes>()
            .and_then(AuthCtx::from_attributes)
            .map(AuthCtxExtractor)
            .ok_or(AppError::Unauthorized)
    }
}
