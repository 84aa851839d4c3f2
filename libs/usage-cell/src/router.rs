// =====================================================================================
// USAGE CELL ROUTER
// =====================================================================================

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

use crate::handlers::{get_ec2_usage, get_free_tier_usage, UsageState};

pub fn usage_routes(state: Arc<UsageState>) -> Router {
    Router::new()
        .route("/ec2-usage", get(get_ec2_usage))
        .route("/free-tier-usage", get(get_free_tier_usage))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
