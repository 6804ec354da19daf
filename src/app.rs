/*
 * Responsibility
 * - Config読み込み → 依存生成 (Basic validator, AuthPipeline) → Router 組み立て
 * - Middleware の適用 (combined gate / HTTP 共通)
 * - axum::serve() で起動
 */
use axum::Router;
use std::{panic, process, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::error::AppError;
use crate::middleware;
use crate::middleware::http::HttpSettings;
use crate::services::auth::{AuthPipeline, ClientSecretValidator};
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,basic_bearer_gate=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // development: fail fast. production: default hook, keep serving.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<(), AppError> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting combined auth gate in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config);
    let app = build_router(state, HttpSettings::from_config(&config));

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, addr = %config.addr, "failed to bind");
            AppError::Internal
        })?;
    axum::serve(listener, app).await.map_err(|e| {
        tracing::error!(error = %e, "server error");
        AppError::Internal
    })?;

    Ok(())
}

fn build_state(config: &Config) -> AppState {
    let basic = ClientSecretValidator::new(config.basic_clients.iter().cloned());
    if basic.is_empty() {
        tracing::warn!("no basic clients configured; every request will be rejected");
    } else {
        tracing::info!(clients = basic.len(), "basic clients loaded");
    }

    // Signing key is resolved exactly once here; absence disables the pipeline.
    let pipeline = AuthPipeline::init(
        Arc::new(basic),
        &config.signing,
        config.token_verify_timeout,
    );

    AppState::new(Arc::new(pipeline))
}

fn build_router(state: AppState, http: HttpSettings) -> Router {
    let protected = middleware::auth::combined::apply(api::v1::protected_routes(), state.clone());

    let router = Router::new()
        .merge(api::v1::public_routes())
        .nest("/api/v1", protected)
        .with_state(state);

    middleware::http::apply(router, http)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use chrono::Utc;
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::services::auth::{BasicClient, SigningSource};

    const SECRET: &str = "router-test-secret";

    fn router(sign_key: Option<&str>) -> Router {
        let basic = ClientSecretValidator::new([BasicClient::from_secret("app1", "pw")]);
        let source = sign_key.map(SigningSource::with_sign_key).unwrap_or_default();
        let pipeline = AuthPipeline::init(Arc::new(basic), &source, Duration::from_secs(5));
        build_router(AppState::new(Arc::new(pipeline)), HttpSettings::default())
    }

    async fn json_body(res: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(res.into_body(), 64 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_public_and_reports_gate_state() {
        let res = router(None)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await, json!({"status": "ok", "auth": "disabled"}));

        let res = router(Some(SECRET))
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(json_body(res).await["auth"], "enabled");
    }

    #[tokio::test]
    async fn me_returns_gate_attributes() {
        let token = jsonwebtoken::encode(
            &Header::default(),
            &json!({"sub": "u1", "aud": "app1", "exp": Utc::now().timestamp() + 600}),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        let authorization = format!("Basic {}, Bearer {}", STANDARD.encode("app1:pw"), token);

        let res = router(Some(SECRET))
            .oneshot(
                Request::builder()
                    .uri("/api/v1/me")
                    .header(header::AUTHORIZATION, authorization)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            json_body(res).await,
            json!({"remote_user": "u1", "authorization_type": "Bearer", "client_id": "app1"})
        );
    }

    #[tokio::test]
    async fn me_without_credentials_is_unauthorized() {
        let res = router(Some(SECRET))
            .oneshot(Request::builder().uri("/api/v1/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert!(res.headers().get("x-request-id").is_some());
    }
}
