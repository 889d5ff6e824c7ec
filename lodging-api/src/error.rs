use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lodging_core::CoreError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("authentication failed: {0}")]
    AuthenticationError(String),
    #[error("not found: {0}")]
    NotFoundError(String),
    #[error("cannot book: {0}")]
    CannotBook(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::CannotBook(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

// Anything the engine cannot classify is a client error, as the booking
// routes have always answered.
impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound(_) => AppError::NotFoundError(err.to_string()),
            CoreError::Forbidden(_) => AppError::CannotBook(err.to_string()),
            CoreError::Unexpected(ref detail) => {
                tracing::error!("Booking operation failed: {}", detail);
                AppError::BadRequest("Bad Request".to_string())
            }
        }
    }
}
