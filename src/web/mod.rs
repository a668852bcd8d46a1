// Web server — Axum-based JSON API.
//
// Routes mirror the public moderation API:
//   POST /ia/age_classification
//   POST /ia/hate_speech/detect
//   POST /ia/hate_speech/analyze
//   GET  /health
// Handlers are thin: validate the body, call the service, serialize its
// structured response. Use-case failures are already folded into
// `success: false` bodies, so only malformed requests get non-2xx statuses.

use std::sync::Arc;

use anyhow::Result;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::service::ModerationService;

pub mod handlers;

/// Shared application state threaded through all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ModerationService>,
}

/// Start the Axum web server and block until it exits.
pub async fn run_server(service: Arc<ModerationService>, port: u16, bind: &str) -> Result<()> {
    let app = build_router(AppState { service });

    let addr = format!("{bind}:{port}");
    info!("Moderation API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let hate_speech = Router::new()
        .route("/detect", post(handlers::hate_speech::detect))
        .route("/analyze", post(handlers::hate_speech::analyze));

    let ia = Router::new()
        .route("/age_classification", post(handlers::age::classify_age))
        .nest("/hate_speech", hate_speech);

    Router::new()
        .nest("/ia", ia)
        .route("/health", get(health))
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness probe — always returns 200 OK.
async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({ "status": "ok" })),
    )
}

/// Typed JSON error response helper.
pub fn api_error(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(serde_json::json!({ "error": message }))).into_response()
}
