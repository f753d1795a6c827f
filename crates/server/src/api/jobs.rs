//! Current posting set and read-marking.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use jobcast_core::Job;

use crate::state::AppState;

use super::{api_error, ErrorResponse};

#[derive(Serialize, utoipa::ToSchema)]
pub struct JobsResponse {
    pub jobs: Vec<Job>,
    pub total: usize,
    pub unread: usize,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ReadResponse {
    /// Postings flipped from unread to read by this call.
    pub marked: usize,
    pub unread: usize,
}

#[utoipa::path(
    get,
    path = "/api/jobs",
    tag = "Jobs",
    responses(
        (status = 200, description = "Active postings, newest first, blocked clients excluded", body = JobsResponse)
    )
)]
pub async fn jobs_list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JobsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let jobs = state.coordinator.active_jobs().map_err(api_error)?;
    let unread = jobs.iter().filter(|job| !job.is_read).count();
    Ok(Json(JobsResponse {
        total: jobs.len(),
        unread,
        jobs,
    }))
}

#[utoipa::path(
    post,
    path = "/api/jobs/{id}/read",
    tag = "Jobs",
    params(
        ("id" = String, Path, description = "Posting id")
    ),
    responses(
        (status = 200, description = "Posting marked read", body = ReadResponse),
        (status = 404, description = "Unknown posting id", body = ErrorResponse)
    )
)]
pub async fn jobs_mark_read(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ReadResponse>, (StatusCode, Json<ErrorResponse>)> {
    let marked = state.coordinator.mark_read(&id).map_err(api_error)?;
    if !marked {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("unknown job id '{id}'"),
            }),
        ));
    }
    Ok(Json(ReadResponse {
        marked: 1,
        unread: state.coordinator.status().unread_count,
    }))
}

#[utoipa::path(
    post,
    path = "/api/jobs/read-all",
    tag = "Jobs",
    responses(
        (status = 200, description = "Every posting marked read", body = ReadResponse)
    )
)]
pub async fn jobs_mark_all_read(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReadResponse>, (StatusCode, Json<ErrorResponse>)> {
    let marked = state.coordinator.mark_all_read().map_err(api_error)?;
    Ok(Json(ReadResponse {
        marked,
        unread: state.coordinator.status().unread_count,
    }))
}
