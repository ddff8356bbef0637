use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::error::CommerceError;
use thiserror::Error;
use tracing::error;
use utils::response::ErrorBody;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Commerce(#[from] CommerceError),
    #[error("invalid request body: {}", .0.body_text())]
    Json(#[from] JsonRejection),
    #[error("invalid query string: {}", .0.body_text())]
    Query(#[from] QueryRejection),
    #[error("invalid path: {}", .0.body_text())]
    Path(#[from] PathRejection),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Commerce(CommerceError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Commerce(CommerceError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Commerce(CommerceError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::Commerce(CommerceError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Json(_) | ApiError::Query(_) | ApiError::Path(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(error = %self, "Request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        ErrorBody::new(message).into_response_with(status)
    }
}
