// libs/collaborator-cell/src/router.rs
use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

use crate::handlers::get_github_users;
use crate::services::GitHubClient;

pub fn collaborator_routes(client: Arc<GitHubClient>) -> Router {
    Router::new()
        .route("/github-users", get(get_github_users))
        .layer(CorsLayer::permissive())
        .with_state(client)
}
