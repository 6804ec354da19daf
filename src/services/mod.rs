/*
 * Responsibility
 * - ドメイン寄りのサービス (認証パイプライン、トークン検証など)
 * - HTTP/axum への依存は request アダプタに閉じ込める
 */
pub mod auth;
