use axum::Router;
use tower_http::services::ServeDir;

use collaborator_cell::collaborator_routes;
use usage_cell::usage_routes;

use crate::bootstrap::AppContext;

pub fn create_router(context: &AppContext) -> Router {
    let api = Router::new()
        .merge(usage_routes(context.usage.clone()))
        .merge(collaborator_routes(context.collaborators.clone()));

    Router::new()
        .nest("/api", api)
        .fallback_service(ServeDir::new(&context.config.frontend_dir))
}
