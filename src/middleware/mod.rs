/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: combined Basic+Bearer gate
 * - http: request id / trace / body limit / timeout
 */
pub mod auth;
pub mod http;
