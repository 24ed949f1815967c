use axum::extract::rejection::FormRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dockyard_common::{DockyardError, ErrorPayload};
use tracing::{error, warn};

/// Every failure a handler can return. Rendered as `{"message": ..}`.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Internal(String),
}

impl From<DockyardError> for AppError {
    fn from(err: DockyardError) -> Self {
        if err.is_client_error() {
            AppError::BadRequest(err.to_string())
        } else {
            AppError::Internal(err.to_string())
        }
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => {
                warn!(%msg, "Rejected request");
                (StatusCode::BAD_REQUEST, msg)
            }
            AppError::Internal(msg) => {
                error!(%msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(ErrorPayload { message })).into_response()
    }
}
