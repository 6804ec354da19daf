/*
 * Responsibility
 * - GET /health (疎通用, gate の外)
 * - combined auth が有効かどうか (署名鍵が解決できたか) も返す
 */
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let auth = if state.auth.is_enabled() {
        "enabled"
    } else {
        "disabled"
    };
    (StatusCode::OK, Json(json!({"status": "ok", "auth": auth})))
}
