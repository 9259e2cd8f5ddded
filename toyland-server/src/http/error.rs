//! API error type
//!
//! Clients never get a structured error body. Failures are logged and
//! answered with a bare 500, except for request bodies the JSON parser
//! rejects, which get a plain-text 400.

use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::FieldsError;
use crate::store::StoreError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Path id is not a 24-character hex ObjectId
    #[error("invalid toy id: {0}")]
    InvalidId(#[from] bson::oid::Error),

    #[error("request body is not a toy document: {0}")]
    Fields(#[from] FieldsError),

    #[error("malformed JSON body: {0}")]
    MalformedJson(String),

    #[error(transparent)]
    Body(#[from] BytesRejection),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::MalformedJson(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            Self::Body(rejection) => rejection.into_response(),
            other => {
                tracing::error!(error = %other, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
