//! Bot lifecycle commands and the status payload.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use jobcast_pipeline::BotStatus;

use crate::state::AppState;

use super::{api_error, AckResponse, ErrorResponse};

#[utoipa::path(
    get,
    path = "/api/status",
    tag = "Bot",
    responses(
        (status = 200, description = "Full pipeline status", body = BotStatus)
    )
)]
pub async fn status(State(state): State<Arc<AppState>>) -> Json<BotStatus> {
    Json(state.coordinator.status())
}

#[utoipa::path(
    post,
    path = "/api/bot/start",
    tag = "Bot",
    responses(
        (status = 200, description = "Ingestion loop started", body = AckResponse),
        (status = 409, description = "Already running or paused", body = ErrorResponse),
        (status = 503, description = "Source connector unreachable", body = ErrorResponse)
    )
)]
pub async fn bot_start(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AckResponse>, (StatusCode, Json<ErrorResponse>)> {
    state.coordinator.clone().start().await.map_err(api_error)?;
    Ok(Json(AckResponse {
        ok: true,
        state: state.coordinator.state(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/bot/stop",
    tag = "Bot",
    responses(
        (status = 200, description = "Ingestion stopped, state cleared", body = AckResponse)
    )
)]
pub async fn bot_stop(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AckResponse>, (StatusCode, Json<ErrorResponse>)> {
    state.coordinator.stop().await.map_err(api_error)?;
    Ok(Json(AckResponse {
        ok: true,
        state: state.coordinator.state(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/bot/pause",
    tag = "Bot",
    responses(
        (status = 200, description = "Cycles suspended, loop keeps ticking", body = AckResponse),
        (status = 409, description = "Not running", body = ErrorResponse)
    )
)]
pub async fn bot_pause(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AckResponse>, (StatusCode, Json<ErrorResponse>)> {
    state.coordinator.pause().map_err(api_error)?;
    Ok(Json(AckResponse {
        ok: true,
        state: state.coordinator.state(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/bot/resume",
    tag = "Bot",
    responses(
        (status = 200, description = "Cycles resumed", body = AckResponse),
        (status = 409, description = "Not paused", body = ErrorResponse)
    )
)]
pub async fn bot_resume(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AckResponse>, (StatusCode, Json<ErrorResponse>)> {
    state.coordinator.resume().map_err(api_error)?;
    Ok(Json(AckResponse {
        ok: true,
        state: state.coordinator.state(),
    }))
}
