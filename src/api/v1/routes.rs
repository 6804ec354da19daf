/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - public (認証なし) と protected (combined Basic+Bearer) を分ける
 * - gate の適用は app.rs 側 (middleware::auth::combined::apply)
 */
use axum::{Router, routing::get};

use crate::state::AppState;

use crate::api::v1::handlers::{health::health, me::me};

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/me", get(me))
}
