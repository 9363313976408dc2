//! Download job handlers.

use crate::api::{AppState, auth::AuthUser};
use crate::error::Error;
use crate::types::{JobId, JobInfo, JobList, ResultHandle};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use super::CreateJobRequest;

/// GET /downloads - List the caller's downloads with status counts
#[utoipa::path(
    get,
    path = "/api/v1/downloads",
    tag = "downloads",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Downloads, newest first, and counts over them", body = JobList),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn list_jobs(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<JobList>, Error> {
    let list = state.tracker.list_with_stats(auth.user.id).await?;
    Ok(Json(list))
}

/// POST /downloads - Start tracking a new download
#[utoipa::path(
    post,
    path = "/api/v1/downloads",
    tag = "downloads",
    security(("bearer_auth" = [])),
    request_body = CreateJobRequest,
    responses(
        (status = 201, description = "Download accepted in pending state", body = JobInfo),
        (status = 400, description = "Missing or invalid URL", body = crate::error::ApiError),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
        (status = 409, description = "URL already being tracked", body = crate::error::ApiError),
        (status = 503, description = "Shutting down", body = crate::error::ApiError)
    )
)]
pub async fn create_job(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<CreateJobRequest>,
) -> Result<impl IntoResponse, Error> {
    let job = state.tracker.create_job(auth.user.id, &request.url).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /downloads/:id - Get one of the caller's downloads
#[utoipa::path(
    get,
    path = "/api/v1/downloads/{id}",
    tag = "downloads",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Download ID")
    ),
    responses(
        (status = 200, description = "Download information", body = JobInfo),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
        (status = 404, description = "Download not found", body = crate::error::ApiError)
    )
)]
pub async fn get_job(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<JobInfo>, Error> {
    let job = state.tracker.get_job(auth.user.id, JobId(id)).await?;
    Ok(Json(job))
}

/// GET /downloads/:id/file - Result handle of a completed download
#[utoipa::path(
    get,
    path = "/api/v1/downloads/{id}/file",
    tag = "downloads",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Download ID")
    ),
    responses(
        (status = 200, description = "Result of the completed download", body = ResultHandle),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
        (status = 404, description = "Download not found or not completed", body = crate::error::ApiError)
    )
)]
pub async fn get_job_file(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<ResultHandle>, Error> {
    let handle = state.tracker.fetch_result(auth.user.id, JobId(id)).await?;
    Ok(Json(handle))
}
