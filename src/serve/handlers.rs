use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use super::json_error;
use super::state::AppState;
use crate::domain::FeedEnvelope;
use crate::feed::ActivityError;

#[derive(Debug, Deserialize)]
pub(crate) struct ActivityQuery {
    user_id: Option<String>,
}

/// Fallback handler for unmatched routes.
pub(crate) async fn handle_not_found() -> impl IntoResponse {
    json_error(StatusCode::NOT_FOUND, "not found")
}

/// GET /health
pub(crate) async fn handle_health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// GET /activities/?user_id=ID
pub(crate) async fn handle_activities(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ActivityQuery>,
) -> Response {
    match state
        .service
        .get_user_activities(query.user_id.as_deref())
        .await
    {
        Ok(activities) => (StatusCode::OK, Json(FeedEnvelope::new(activities))).into_response(),
        Err(e @ (ActivityError::InvalidInput(_) | ActivityError::UserNotFound(_))) => {
            json_error(StatusCode::BAD_REQUEST, &e.to_string()).into_response()
        }
        Err(e) => {
            tracing::error!("activity feed failed: {}", e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()).into_response()
        }
    }
}
