//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::completion::UpstreamError;

/// An error returned by a handler or middleware.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("rate limit exceeded; retry in {retry_after_secs}s")]
  RateLimited { retry_after_secs: u64 },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error(transparent)]
  Upstream(#[from] UpstreamError),
}

impl From<tabula_core::Error> for ApiError {
  fn from(e: tabula_core::Error) -> Self { ApiError::BadRequest(e.to_string()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::Unauthorized(_) => {
        let mut res = (
          StatusCode::UNAUTHORIZED,
          Json(json!({ "error": "unauthorized" })),
        )
          .into_response();
        res
          .headers_mut()
          .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        res
      }
      ApiError::BadRequest(m) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": m }))).into_response()
      }
      ApiError::NotFound(m) => {
        (StatusCode::NOT_FOUND, Json(json!({ "error": m }))).into_response()
      }
      ApiError::RateLimited { retry_after_secs } => (
        StatusCode::TOO_MANY_REQUESTS,
        [(header::RETRY_AFTER, retry_after_secs.to_string())],
        Json(json!({ "error": "too many requests" })),
      )
        .into_response(),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store operation failed");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          Json(json!({ "error": "internal server error" })),
        )
          .into_response()
      }
      ApiError::Upstream(e) => upstream_response(e),
    }
  }
}

/// Only a request that was never sent is reported back to the caller.
/// Anything the upstream did is an opaque 500.
fn upstream_response(e: UpstreamError) -> Response {
  match e {
    UpstreamError::Setup(message) => {
      (StatusCode::BAD_REQUEST, Json(message)).into_response()
    }
    UpstreamError::Unavailable(message) => {
      tracing::error!(error = %message, "completion upstream failed");
      (StatusCode::INTERNAL_SERVER_ERROR, "Error streaming data").into_response()
    }
  }
}
