use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Business and infrastructure failures of the admission subsystem.
///
/// The first five variants are expected, user-facing outcomes; their
/// display strings are the messages returned to clients.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Student not found with provided NFC ID")]
    StudentNotFound,

    #[error("No active course found in the specified room at this time")]
    NoActiveCourse,

    #[error("Student is already checked into this class")]
    AlreadyCheckedIn,

    #[error("Request not found")]
    RequestNotFound,

    #[error("Only pending requests can be updated")]
    InvalidTransition,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_debug = format!("{:?}", self);

        let (status, error_message) = match &self {
            AppError::StudentNotFound | AppError::RequestNotFound => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            AppError::NoActiveCourse => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::AlreadyCheckedIn | AppError::InvalidTransition => {
                (StatusCode::CONFLICT, self.to_string())
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_debug,
            "message": error_message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
