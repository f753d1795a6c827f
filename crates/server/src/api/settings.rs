//! Watch configuration reads and partial updates.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use jobcast_core::config::{SettingsUpdate, WatchConfig};

use crate::state::AppState;

use super::{api_error, ErrorResponse};

#[utoipa::path(
    get,
    path = "/api/settings",
    tag = "Settings",
    responses(
        (status = 200, description = "Current watch settings", body = WatchConfig)
    )
)]
pub async fn settings_get(
    State(state): State<Arc<AppState>>,
) -> Result<Json<WatchConfig>, (StatusCode, Json<ErrorResponse>)> {
    Ok(Json(state.coordinator.settings().map_err(api_error)?))
}

#[utoipa::path(
    put,
    path = "/api/settings",
    tag = "Settings",
    request_body = SettingsUpdate,
    responses(
        (status = 200, description = "Updated settings; omitted fields kept their values", body = WatchConfig),
        (status = 400, description = "Rejected update, settings unchanged", body = ErrorResponse)
    )
)]
pub async fn settings_update(
    State(state): State<Arc<AppState>>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<WatchConfig>, (StatusCode, Json<ErrorResponse>)> {
    let applied = state
        .coordinator
        .update_settings(&update)
        .map_err(api_error)?;
    Ok(Json(applied))
}
