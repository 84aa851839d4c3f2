use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// JSON body returned by every failing API route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self { error: message.into() }
    }
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = ErrorBody::new(message);

    if status.is_server_error() {
        tracing::error!("Error: {}: {}", status, body.error);
    } else {
        tracing::warn!("Error: {}: {}", status, body.error);
    }

    (status, Json(body)).into_response()
}
