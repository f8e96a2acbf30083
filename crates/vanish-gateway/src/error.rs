use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;
use vanish_paste::PasteError;

use crate::model::ErrorResponse;

pub type Result<T> = std::result::Result<T, AppError>;

pub const NOT_FOUND_MESSAGE: &str = "Paste not found or expired";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("paste not found")]
    NotFound,
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<PasteError> for AppError {
    fn from(value: PasteError) -> Self {
        match value {
            PasteError::Validation(message) => Self::BadRequest(message),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::BadRequest(message) => message.clone(),
            Self::NotFound => NOT_FOUND_MESSAGE.to_string(),
            Self::Internal(detail) => {
                // details stay in the logs
                error!(error = %detail, "Request failed");
                INTERNAL_ERROR_MESSAGE.to_string()
            }
        };

        (self.status(), Json(ErrorResponse { error: message })).into_response()
    }
}
