use std::sync::Arc;

use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::state::AppState;

/// When an API key is configured, every route except /health needs
/// `Authorization: Bearer <key>`.
pub(crate) async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let expected_key = match &state.api_key {
        Some(k) => k,
        None => return next.run(request).await,
    };

    if request.uri().path() == "/health" {
        return next.run(request).await;
    }

    let token = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "));

    match token {
        Some(token) if token == expected_key.as_str() => next.run(request).await,
        Some(_) => super::json_error(StatusCode::FORBIDDEN, "Invalid credentials").into_response(),
        None => super::json_error(StatusCode::UNAUTHORIZED, "Not authenticated").into_response(),
    }
}
