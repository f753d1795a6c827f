//! Domain-focused API endpoint modules.
//!
//! Each sub-module owns one responsibility area. Shared response types and
//! the error mapping live here in mod.rs.

pub mod control;
pub mod doc;
pub mod health;
pub mod jobs;
pub mod settings;
pub mod stream;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use jobcast_core::PipelineError;
use jobcast_pipeline::BotState;

// ── Shared types ─────────────────────────────────────────────────

/// Error body shared by every endpoint.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Acknowledgement for lifecycle commands, echoing the resulting state.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AckResponse {
    pub ok: bool,
    pub state: BotState,
}

// ── Error mapping ────────────────────────────────────────────────

/// Map pipeline failures onto HTTP statuses: illegal transitions conflict,
/// an unreachable source is a 503, bad settings are a 400, the rest is 500.
pub(crate) fn api_error(err: PipelineError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        PipelineError::InvalidTransition(_) => StatusCode::CONFLICT,
        PipelineError::ConnectorUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        PipelineError::InvalidSettings(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse { error: err.to_string() }))
}

// ── Re-exports ───────────────────────────────────────────────────
// Keeps flat `api::foo` paths in router.rs route registration.

pub use control::{bot_pause, bot_resume, bot_start, bot_stop, status};
pub use health::health;
pub use jobs::{jobs_list, jobs_mark_all_read, jobs_mark_read};
pub use settings::{settings_get, settings_update};
pub use stream::events;
