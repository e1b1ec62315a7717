//! YAML frontmatter extraction and composition.
//!
//! A frontmatter document is a `---` line, a YAML mapping, a closing `---`
//! line, and the markdown body. The whole metadata map is handed to the
//! caller untyped — unrecognized keys are the caller's to preserve.

use crate::{Error, Result};

/// Metadata keys mapped onto catalog fields by the service layer; everything
/// else rides along in `properties` only.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A parsed frontmatter document.
#[derive(Debug, Clone)]
pub struct Document {
  pub metadata: Metadata,
  pub body:     String,
}

/// Split `text` into its YAML metadata map and markdown body.
///
/// The first line must be exactly `---` (trailing whitespace tolerated);
/// a missing or unterminated block is [`Error::MissingFrontmatter`], YAML
/// that is not a mapping is [`Error::NotAMapping`].
pub fn parse(text: &str) -> Result<Document> {
  let mut saw_open = false;
  let mut yaml_start = 0usize;
  let mut offset = 0usize;

  for line in text.split_inclusive('\n') {
    let line_start = offset;
    offset += line.len();
    let trimmed = line.trim_end();

    if !saw_open {
      if trimmed != "---" {
        return Err(Error::MissingFrontmatter);
      }
      saw_open = true;
      yaml_start = offset;
      continue;
    }

    if trimmed == "---" {
      let metadata = parse_metadata(&text[yaml_start..line_start])?;
      return Ok(Document {
        metadata,
        body: text[offset..].to_string(),
      });
    }
  }

  // Opening delimiter without a closing one (or empty input).
  Err(Error::MissingFrontmatter)
}

fn parse_metadata(yaml_src: &str) -> Result<Metadata> {
  let value: serde_json::Value = serde_yaml::from_str(yaml_src)?;
  match value {
    serde_json::Value::Object(map) => Ok(map),
    _ => Err(Error::NotAMapping),
  }
}

/// Compose a frontmatter document from a metadata map and a body — the
/// inverse of [`parse`], used to hand synthesized documents back to callers.
pub fn compose(metadata: &Metadata, body: &str) -> Result<String> {
  let yaml = serde_yaml::to_string(metadata)?;
  Ok(format!("---\n{yaml}---\n\n{body}"))
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  const DOC: &str = "---\n\
    title: \"T\"\n\
    author: A\n\
    url: https://x\n\
    tags:\n\
    \x20 - t1\n\
    \x20 - t2\n\
    custom_field: kept\n\
    ---\n\
    # Body\n\
    \n\
    Text.\n";

  #[test]
  fn parses_metadata_and_body() {
    let doc = parse(DOC).unwrap();
    assert_eq!(doc.metadata["title"], json!("T"));
    assert_eq!(doc.metadata["author"], json!("A"));
    assert_eq!(doc.metadata["tags"], json!(["t1", "t2"]));
    assert!(doc.body.starts_with("# Body"));
  }

  #[test]
  fn keeps_unrecognized_keys() {
    let doc = parse(DOC).unwrap();
    assert_eq!(doc.metadata["custom_field"], json!("kept"));
  }

  #[test]
  fn missing_delimiters_is_an_error() {
    let err = parse("# Just markdown\n\nNo frontmatter.\n").unwrap_err();
    assert!(matches!(err, Error::MissingFrontmatter));
  }

  #[test]
  fn unterminated_block_is_an_error() {
    let err = parse("---\ntitle: T\nnever closed\n").unwrap_err();
    assert!(matches!(err, Error::MissingFrontmatter));
  }

  #[test]
  fn empty_input_is_an_error() {
    assert!(matches!(parse(""), Err(Error::MissingFrontmatter)));
  }

  #[test]
  fn non_mapping_frontmatter_is_an_error() {
    let err = parse("---\n- just\n- a\n- list\n---\nbody\n").unwrap_err();
    assert!(matches!(err, Error::NotAMapping));
  }

  #[test]
  fn invalid_yaml_is_an_error() {
    let err = parse("---\ntitle: [unclosed\n---\nbody\n").unwrap_err();
    assert!(matches!(err, Error::Yaml(_)));
  }

  #[test]
  fn tolerates_crlf_line_endings() {
    let doc = parse("---\r\ntitle: T\r\n---\r\nbody\r\n").unwrap();
    assert_eq!(doc.metadata["title"], json!("T"));
    assert_eq!(doc.body, "body\r\n");
  }

  #[test]
  fn compose_then_parse_round_trips() {
    let mut metadata = Metadata::new();
    metadata.insert("title".into(), json!("Round Trip"));
    metadata.insert("tags".into(), json!(["a", "b"]));

    let text = compose(&metadata, "# Body\n").unwrap();
    let doc = parse(&text).unwrap();
    assert_eq!(doc.metadata, metadata);
    assert!(doc.body.trim_start().starts_with("# Body"));
  }
}
