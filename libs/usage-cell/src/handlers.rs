// =====================================================================================
// USAGE CELL HANDLERS
// =====================================================================================

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::instrument;

use shared_models::error_response;

use crate::models::{FreeTierNotice, InstanceIdentity, InstanceUsage, UsageError};
use crate::services::CloudWatchClient;

/// Shared, read-only state for the usage routes. Built once at startup.
#[derive(Debug)]
pub struct UsageState {
    pub metrics: CloudWatchClient,
    pub identity: InstanceIdentity,
}

impl UsageState {
    pub fn new(metrics: CloudWatchClient, identity: InstanceIdentity) -> Self {
        Self { metrics, identity }
    }
}

#[instrument(skip(state))]
pub async fn get_ec2_usage(
    State(state): State<Arc<UsageState>>,
) -> Result<Json<InstanceUsage>, UsageError> {
    let usage = state.metrics.fetch_instance_metrics(&state.identity).await?;
    Ok(Json(usage))
}

/// Free tier accounting is deliberately not computed; the response is constant.
pub async fn get_free_tier_usage() -> Json<FreeTierNotice> {
    Json(FreeTierNotice::current())
}

// =====================================================================================
// ERROR RESPONSE IMPLEMENTATION
// =====================================================================================

impl IntoResponse for UsageError {
    fn into_response(self) -> Response {
        let status = match self {
            UsageError::IdentityMissing => StatusCode::SERVICE_UNAVAILABLE,
            UsageError::Remote(_)
            | UsageError::Credentials(_)
            | UsageError::InvalidEndpoint(_)
            | UsageError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        error_response(status, self.to_string())
    }
}
