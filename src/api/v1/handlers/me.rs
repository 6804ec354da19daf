/*
 * Responsibility
 * - GET /api/v1/me (combined gate の内側)
 * - gate が書いた request attributes をそのまま返す
 */
use axum::Json;

use crate::api::v1::dto::me::MeResponse;
use crate::api::v1::extractors::AuthCtxExtractor;

pub async fn me(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<MeResponse> {
    Json(ctx.into())
}
