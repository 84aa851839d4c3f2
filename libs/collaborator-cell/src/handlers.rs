// libs/collaborator-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::instrument;

use shared_models::error_response;

use crate::models::{CollaboratorError, CollaboratorRecord};
use crate::services::GitHubClient;

#[instrument(skip(client))]
pub async fn get_github_users(
    State(client): State<Arc<GitHubClient>>,
) -> Result<Json<Vec<CollaboratorRecord>>, CollaboratorError> {
    let collaborators = client.list_collaborators().await?;
    Ok(Json(collaborators))
}

impl IntoResponse for CollaboratorError {
    fn into_response(self) -> Response {
        error_response(StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
    }
}
