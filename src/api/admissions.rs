use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::models::{AdmissionRequestView, RequestStatus};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admission-requests", post(create_request))
        .route("/api/admission-requests/expire", post(expire_old_requests))
        .route("/api/admission-requests/approve", post(approve_student_entry))
        .route("/api/admission-requests/:id", get(get_request_by_id))
        .route("/api/admission-requests/:id/status", put(update_request_status))
        .route(
            "/api/admission-requests/instructor/:id",
            get(get_requests_by_instructor),
        )
        .route(
            "/api/admission-requests/instructor/:id/ongoing",
            get(get_pending_for_ongoing_lecture),
        )
        .route(
            "/api/admission-requests/student/:id",
            get(get_requests_by_student),
        )
        .route(
            "/api/admission-requests/room/:id/pending",
            get(get_pending_requests_by_room),
        )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestBody {
    pub nfc_id: String,
    pub room_id: i64,
    pub reason: Option<String>,
}

/// Student endpoint: an NFC tap at a room.
async fn create_request(
    State(state): State<AppState>,
    Json(body): Json<CreateRequestBody>,
) -> Result<Json<AdmissionRequestView>> {
    let view = state
        .admissions
        .create_request(&body.nfc_id, body.room_id, body.reason)
        .await?;
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusBody {
    pub status: RequestStatus,
}

/// Instructor endpoint: settle a pending request by id.
async fn update_request_status(
    State(state): State<AppState>,
    Path(request_id): Path<i64>,
    Json(body): Json<UpdateStatusBody>,
) -> Result<Json<AdmissionRequestView>> {
    let view = state
        .admissions
        .update_request_status(request_id, body.status)
        .await?;
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveEntryBody {
    pub instructor_id: i64,
    pub student_id: i64,
    pub is_approved: bool,
}

/// Instructor endpoint: settle the pending request of a student in the
/// instructor's ongoing lecture.
async fn approve_student_entry(
    State(state): State<AppState>,
    Json(body): Json<ApproveEntryBody>,
) -> Result<Json<AdmissionRequestView>> {
    let view = state
        .admissions
        .approve_student_entry(body.instructor_id, body.student_id, body.is_approved)
        .await?;
    Ok(Json(view))
}

async fn get_request_by_id(
    State(state): State<AppState>,
    Path(request_id): Path<i64>,
) -> Result<Json<AdmissionRequestView>> {
    let view = state.admissions.request_by_id(request_id).await?;
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
pub struct InstructorQuery {
    pub status: Option<String>,
}

async fn get_requests_by_instructor(
    State(state): State<AppState>,
    Path(instructor_id): Path<i64>,
    Query(query): Query<InstructorQuery>,
) -> Result<Json<Vec<AdmissionRequestView>>> {
    let status = query
        .status
        .as_deref()
        .map(|s| s.parse::<RequestStatus>())
        .transpose()
        .map_err(AppError::Validation)?;

    let views = state
        .admissions
        .requests_by_instructor(instructor_id, status)
        .await?;
    Ok(Json(views))
}

async fn get_requests_by_student(
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
) -> Result<Json<Vec<AdmissionRequestView>>> {
    let views = state.admissions.requests_by_student(student_id).await?;
    Ok(Json(views))
}

async fn get_pending_requests_by_room(
    State(state): State<AppState>,
    Path(room_id): Path<i64>,
) -> Result<Json<Vec<AdmissionRequestView>>> {
    let views = state.admissions.pending_requests_by_room(room_id).await?;
    Ok(Json(views))
}

async fn get_pending_for_ongoing_lecture(
    State(state): State<AppState>,
    Path(instructor_id): Path<i64>,
) -> Result<Json<Vec<AdmissionRequestView>>> {
    let views = state
        .admissions
        .pending_for_ongoing_lecture(instructor_id)
        .await?;
    Ok(Json(views))
}

#[derive(Debug, Deserialize)]
pub struct ExpireQuery {
    pub hours: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpireResponse {
    pub message: String,
    pub expired_count: u64,
}

/// Admin/system endpoint: on-demand expiry sweep.
async fn expire_old_requests(
    State(state): State<AppState>,
    Query(query): Query<ExpireQuery>,
) -> Result<Json<ExpireResponse>> {
    let hours = query.hours.unwrap_or(24);
    if hours <= 0 {
        return Err(AppError::Validation(
            "hours must be a positive number".to_string(),
        ));
    }

    let expired_count = state.admissions.expire_old_requests(hours).await?;
    Ok(Json(ExpireResponse {
        message: format!("{expired_count} requests expired"),
        expired_count,
    }))
}
