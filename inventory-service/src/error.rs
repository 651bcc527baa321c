use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use shared::{ErrorResponse, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    BadRequest(String),

    #[error("Product not found.")]
    NotFound,

    /// Datastore failure. The cause is logged where it happens and never
    /// reaches the response body.
    #[error("Internal Server Error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            // No JSON body at all reads as an empty payload.
            JsonRejection::MissingJsonContentType(_) => {
                ApiError::Validation(ValidationError::MissingRequired)
            }
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}
