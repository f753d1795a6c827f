//! HTTP router construction.
//!
//! Assembles all Axum routes, middleware, and OpenAPI docs into a single `Router`.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::api;
use crate::state::AppState;

/// Build the complete application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(api::health))
        .route("/api/status", get(api::status))
        .route("/api/bot/start", post(api::bot_start))
        .route("/api/bot/stop", post(api::bot_stop))
        .route("/api/bot/pause", post(api::bot_pause))
        .route("/api/bot/resume", post(api::bot_resume))
        .route("/api/jobs", get(api::jobs_list))
        .route("/api/jobs/read-all", post(api::jobs_mark_all_read))
        .route("/api/jobs/{id}/read", post(api::jobs_mark_read))
        .route(
            "/api/settings",
            get(api::settings_get).put(api::settings_update),
        )
        .route("/api/events", get(api::events))
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(Scalar::with_url("/docs", api::doc::ApiDoc::openapi()))
}
