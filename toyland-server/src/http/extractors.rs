//! Custom Axum extractors

use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use bson::Document;
use serde_json::Value;

use super::error::ApiError;
use crate::models::fields_from_json;

/// Toy fields from a request body.
///
/// Lenient: a request without a JSON content type, or with an empty body,
/// yields no fields rather than a rejection. Only objects and arrays are
/// accepted as top-level JSON; arrays then fail document conversion.
pub struct ToyFields(pub Document);

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

impl<S> FromRequest<S> for ToyFields
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let json = is_json(req.headers());
        let bytes = Bytes::from_request(req, state).await?;

        if !json || bytes.is_empty() {
            return Ok(Self(Document::new()));
        }

        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::MalformedJson(e.to_string()))?;

        if !(value.is_object() || value.is_array()) {
            return Err(ApiError::MalformedJson(
                "top-level JSON value must be an object or array".into(),
            ));
        }

        Ok(Self(fields_from_json(value)?))
    }
}
