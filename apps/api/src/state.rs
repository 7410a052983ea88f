use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::ratelimit::RateLimiter;
use crate::screening::engine::ScreeningEngine;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub rate_limiter: RateLimiter,
    /// Shared by every request; each turn owns its profile, so no lock is needed.
    pub engine: Arc<ScreeningEngine>,
    pub config: Config,
}
