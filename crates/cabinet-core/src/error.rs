//! Error types for `cabinet-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A tenant path segment failed identifier validation. These strings end
  /// up in SQL identifier and filesystem path positions, so the allowed
  /// alphabet is restrictive by contract.
  #[error("invalid {segment} identifier: {value:?}")]
  InvalidIdentifier {
    segment: &'static str,
    value:   String,
  },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
