use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use teesheet_core::CoreError;

#[derive(Debug)]
pub enum AppError {
    Core(CoreError),
    BadRequest(String),
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let err = match self {
            AppError::BadRequest(msg) => {
                return (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response();
            }
            AppError::Core(err) => err,
        };

        let (status, body) = match &err {
            CoreError::NotFound(_) => (StatusCode::NOT_FOUND, json!({ "error": err.to_string() })),
            CoreError::Blocked { reason } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": err.to_string(), "block_reason": reason }),
            ),
            e if e.is_conflict() => (
                StatusCode::CONFLICT,
                json!({ "error": e.to_string(), "remaining_capacity": e.remaining_capacity() }),
            ),
            e if e.is_invalid_request() => (StatusCode::BAD_REQUEST, json!({ "error": e.to_string() })),
            e => {
                tracing::error!("Internal Server Error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
