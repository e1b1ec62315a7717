//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure crossing the HTTP boundary becomes a structured
//! `{"error": ...}` body; internal error text is included as the
//! human-readable detail, never a stack trace.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use cabinet_core::store::StorageFailure;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// Frontmatter missing or malformed, or an ingestion source could not be
  /// converted into a document.
  #[error("invalid document: {0}")]
  InvalidDocument(String),

  /// The tenant's storage could not be acquired; retryable by the client.
  #[error("storage unavailable: {0}")]
  Unavailable(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a backend failure: acquisition problems are 503, everything
  /// else is the store's fault (500).
  pub fn from_store<E>(err: E) -> Self
  where
    E: std::error::Error + StorageFailure + Send + Sync + 'static,
  {
    if err.is_unavailable() {
      ApiError::Unavailable(err.to_string())
    } else {
      ApiError::Store(Box::new(err))
    }
  }

  /// Ingestion failures are always the caller's: a malformed document or a
  /// URL that could not be fetched/converted.
  pub fn from_ingest(err: cabinet_ingest::Error) -> Self {
    if err.is_document_error() {
      ApiError::InvalidDocument(err.to_string())
    } else {
      ApiError::BadRequest(err.to_string())
    }
  }
}

impl From<cabinet_core::Error> for ApiError {
  fn from(err: cabinet_core::Error) -> Self {
    ApiError::BadRequest(err.to_string())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::InvalidDocument(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unavailable(m) => (StatusCode::SERVICE_UNAVAILABLE, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
