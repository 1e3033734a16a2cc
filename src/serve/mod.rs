//! HTTP surface for the activity feed.
//!
//! Endpoints:
//! - GET /health                    - Server status (exempt from auth)
//! - GET /activities/?user_id=ID    - Activity feed envelope for one user
//!
//! All responses use Content-Type: application/json.

mod handlers;
mod middleware;
mod state;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{middleware as axum_middleware, Json, Router};
use tower_http::cors::{Any, CorsLayer};

use self::handlers::{handle_activities, handle_health, handle_not_found};
use self::middleware::auth_middleware;
use self::state::AppState;
use crate::domain::ErrorBody;
use crate::feed::ActivityService;

fn json_error(status: StatusCode, message: &str) -> impl IntoResponse {
    (status, Json(ErrorBody::new(message)))
}

pub fn router(service: ActivityService, api_key: Option<String>) -> Router {
    let state = Arc::new(AppState { service, api_key });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/activities", get(handle_activities))
        .route("/activities/", get(handle_activities))
        .fallback(handle_not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(cors)
        .with_state(state)
}

/// Serve the feed on `0.0.0.0:<port>` until Ctrl+C.
pub async fn start_server(
    port: u16,
    service: ActivityService,
    api_key: Option<String>,
) -> std::io::Result<()> {
    if api_key.is_some() {
        tracing::info!("API key authentication enabled");
    }
    let app = router(service, api_key);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Activity feed listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Received shutdown signal");
}
