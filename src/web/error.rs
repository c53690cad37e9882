//! Maps [`Error`] onto HTTP responses.

use crate::errors::Error;
use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

impl Error {
    /// Status code this error is answered with.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::ApprovalPending => StatusCode::FORBIDDEN,
            Self::UsernameTaken { .. } => StatusCode::CONFLICT,
            Self::Validation { .. } | Self::Upload { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Database(_) | Self::Config { .. } | Self::Io(_) | Self::PasswordHash { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            // Internal details stay in the log.
            error!(error = %self, "Request failed");
            return (status, Json(json!({ "error": "Internal server error" }))).into_response();
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<MultipartError> for Error {
    fn from(value: MultipartError) -> Self {
        Self::Upload {
            message: value.body_text(),
        }
    }
}
