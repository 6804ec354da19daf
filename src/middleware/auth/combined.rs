//! Combined Basic + Bearer gate → RequestAttributes / AuthCtx を extensions に入れる
//!
//! - `AuthPipeline::validate` の結果 (bool) を HTTP に写像する: false → 401
//! - 失敗理由はレスポンスに出さない (ログにだけ残す)

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::services::auth::HttpExchange;
use crate::state::AppState;

/// Put the combined gate in front of every route of `router`.
///
/// ```ignore
/// let v1 = api::v1::protected_routes();
/// let v1 = middleware::auth::combined::apply(v1, state.clone());
/// app = app.nest("/api/v1", v1);
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, combined_middleware))
}

async fn combined_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let mut exchange = HttpExchange::new(req);

    if !state.auth.has_basic_and_jwt_header(&exchange) {
        tracing::debug!("request without combined basic+bearer authorization");
        return Err(AppError::Unauthorized);
    }

    if !state.auth.validate(&mut exchange).await {
        tracing::info!("combined basic+bearer authentication failed");
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(exchange.into_request()).await)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        Extension,
        body::to_bytes,
        http::{StatusCode, header},
        routing::post,
    };
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use chrono::Utc;
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::services::auth::request::{AUTHORIZATION_TYPE, REMOTE_USER};
    use crate::services::auth::{
        AuthPipeline, BasicClient, ClientSecretValidator, RequestAttributes, SigningSource,
    };

    const SECRET: &str = "gate-test-secret";

    fn state(sign_key: Option<&str>) -> AppState {
        let basic = Arc::new(ClientSecretValidator::new([BasicClient::from_secret("app1", "pw")]));
        let source = sign_key.map(SigningSource::with_sign_key).unwrap_or_default();
        AppState::new(Arc::new(AuthPipeline::init(basic, &source, Duration::from_secs(5))))
    }

    // Echo the body back along with the attributes the gate wrote.
    async fn echo(Extension(attrs): Extension<RequestAttributes>, body: String) -> String {
        format!(
            "{}|{}|{}",
            attrs.get(REMOTE_USER).unwrap_or("-"),
            attrs.get(AUTHORIZATION_TYPE).unwrap_or("-"),
            body
        )
    }

    fn app(state: AppState) -> Router {
        let protected = Router::new().route("/echo", post(echo));
        apply(protected, state.clone()).with_state(state)
    }

    fn token(aud: &str, exp_offset: i64) -> String {
        let claims = json!({"sub": "u1", "aud": aud, "exp": Utc::now().timestamp() + exp_offset});
        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn request(authorization: Option<String>) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri("/echo");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::from("hello")).unwrap()
    }

    fn combined(id: &str, secret: &str, bearer: &str) -> String {
        format!("Basic {}, Bearer {}", STANDARD.encode(format!("{id}:{secret}")), bearer)
    }

    #[tokio::test]
    async fn valid_credentials_reach_the_handler_with_body_intact() {
        let res = app(state(Some(SECRET)))
            .oneshot(request(Some(combined("app1", "pw", &token("app1", 3600)))))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let bytes = to_bytes(res.into_body(), 1024).await.unwrap();
        assert_eq!(&bytes[..], b"u1|Bearer|hello");
    }

    #[tokio::test]
    async fn failures_map_to_401() {
        let cases = [
            None,
            Some("Basic abc".to_string()),
            Some(combined("app1", "wrong", &token("app1", 3600))),
            Some(combined("app1", "pw", &token("app2", 3600))),
            Some(combined("app1", "pw", &token("app1", -10))),
            Some(combined("app1", "pw", "not-a-jwt")),
        ];

        for authorization in cases {
            let res = app(state(Some(SECRET)))
                .oneshot(request(authorization))
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(
                res.headers().get(header::WWW_AUTHENTICATE).unwrap(),
                "Basic, Bearer"
            );
        }
    }

    #[tokio::test]
    async fn missing_signing_key_denies_everything() {
        let res = app(state(None))
            .oneshot(request(Some(combined("app1", "pw", &token("app1", 3600)))))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
