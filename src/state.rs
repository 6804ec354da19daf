/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - auth: AuthPipeline (署名鍵は起動時に一度だけ解決、以後 immutable)
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::services::auth::AuthPipeline;

#[derive(Clone, Debug)]
pub struct AppState {
    pub auth: Arc<AuthPipeline>,
}

impl AppState {
    pub fn new(auth: Arc<AuthPipeline>) -> Self {
        Self { auth }
    }
}
