//! Error type for `cabinet-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] cabinet_core::Error),

  /// The tenant's storage handle could not be acquired (open failure or
  /// acquisition deadline exceeded). Transient; the caller may retry with
  /// backoff, the store itself does not.
  #[error("storage unavailable: {0}")]
  Unavailable(String),

  /// The engine rejected a statement — constraint violation, malformed
  /// query. Not retried.
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

impl cabinet_core::store::StorageFailure for Error {
  fn is_unavailable(&self) -> bool { matches!(self, Error::Unavailable(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
