/*
 * Responsibility
 * - 環境変数や設定の読み込み (PORT, SIGN_KEY, BASIC_CLIENTS など)
 * - 設定値のバリデーション (形式不正なら起動失敗)
 * - SIGN_KEY が無いこと自体は起動失敗にしない (pipeline が disabled になるだけ)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;
use crate::services::auth::pipeline::DEFAULT_VERIFY_TIMEOUT;
use crate::services::auth::signing::SIGN_KEY_NAME;
use crate::services::auth::{BasicClient, SigningSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()))
    }

    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        tracing::error!(error = %e, "failed to load configuration");
        AppError::Internal
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    // Shared settings the pipeline resolves its signing key from.
    pub signing: SigningSource,
    pub token_verify_timeout: Duration,

    pub basic_clients: Vec<BasicClient>,

    pub request_body_limit_bytes: usize,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let mut signing = SigningSource::new();
        if let Ok(key) = std::env::var("SIGN_KEY") {
            signing.insert(SIGN_KEY_NAME, key.replace("\\n", "\n"));
        }

        let token_verify_timeout = std::env::var("TOKEN_VERIFY_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_VERIFY_TIMEOUT);

        let basic_clients =
            parse_basic_clients(&std::env::var("BASIC_CLIENTS").unwrap_or_default())?;

        let request_body_limit_bytes = std::env::var("REQUEST_BODY_LIMIT_BYTES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(1024 * 1024);

        let request_timeout = std::env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));

        Ok(Self {
            addr,
            app_env,
            signing,
            token_verify_timeout,
            basic_clients,
            request_body_limit_bytes,
            request_timeout,
        })
    }
}

/// `BASIC_CLIENTS=app1:<sha256 hex>,app2:<sha256 hex>`
fn parse_basic_clients(raw: &str) -> Result<Vec<BasicClient>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| BasicClient::parse(entry).map_err(|_| ConfigError::Invalid("BASIC_CLIENTS")))
        .collect()
}
