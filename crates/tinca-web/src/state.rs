//! Shared handler state

use crate::auth::TokenIssuer;
use axum::http::HeaderMap;
use std::sync::Arc;
use tinca_core::AppContext;

#[derive(Clone)]
pub struct AppState {
    pub ctx: AppContext,
    pub tokens: Arc<TokenIssuer>,
}

impl AppState {
    pub fn new(ctx: AppContext) -> Self {
        let tokens = TokenIssuer::new(&ctx.config.jwt_secret, ctx.config.token_ttl_secs);
        Self {
            ctx,
            tokens: Arc::new(tokens),
        }
    }

    /// Country of the caller from the configured header, if sent
    pub fn country(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get(self.ctx.config.country_header.as_str())
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}
