//! Error types for the cabinet-ingest adapters.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The document does not start with a `---` frontmatter block, or the
  /// block is never closed.
  #[error("document has no frontmatter delimiters")]
  MissingFrontmatter,

  #[error("frontmatter is not valid YAML: {0}")]
  Yaml(#[from] serde_yaml::Error),

  /// The frontmatter parsed, but to something other than a key→value
  /// mapping.
  #[error("frontmatter is not a mapping")]
  NotAMapping,

  #[error("invalid URL {url:?}: {reason}")]
  InvalidUrl { url: String, reason: String },

  #[error("fetch failed for {url}: {reason}")]
  Fetch { url: String, reason: String },

  /// The fetched resource is not HTML; nothing to convert.
  #[error("unsupported content type {content_type:?} for {url}")]
  UnsupportedContentType {
    url:          String,
    content_type: String,
  },
}

impl Error {
  /// Whether this error describes a malformed input document (as opposed
  /// to a fetch/transport failure).
  pub fn is_document_error(&self) -> bool {
    matches!(
      self,
      Error::MissingFrontmatter | Error::Yaml(_) | Error::NotAMapping
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
