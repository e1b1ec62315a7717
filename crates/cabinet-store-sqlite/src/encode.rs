//! Encoding and decoding helpers between catalog records and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 UTC strings. `tags`, `locations`,
//! and `vector` are stored as compact JSON arrays. `properties` is a JSON
//! object blob, or SQL NULL when the value is null/absent/empty — never the
//! string `"null"` or `"{}"`. UUIDs are stored as hyphenated lowercase
//! strings.

use cabinet_core::catalog::Catalog;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Error, Result};

/// Column list shared by every SELECT, in [`RawCatalog::from_row`] order.
pub(crate) const COLUMNS: &str =
  "id, title, author, url, tags, locations, created_at, updated_at, \
   markdown, properties, vector";

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── String lists (tags, locations) ──────────────────────────────────────────

pub fn encode_string_list(items: &[String]) -> Result<String> {
  Ok(serde_json::to_string(items)?)
}

pub fn decode_string_list(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Properties ──────────────────────────────────────────────────────────────

/// A null or empty-object value encodes to SQL NULL.
pub fn encode_properties(value: &serde_json::Value) -> Option<String> {
  match value {
    serde_json::Value::Null => None,
    serde_json::Value::Object(map) if map.is_empty() => None,
    other => Some(other.to_string()),
  }
}

/// NULL decodes to the empty object. A blob that is not valid JSON is
/// preserved as a JSON string value rather than failing the read.
pub fn decode_properties(blob: Option<String>) -> serde_json::Value {
  match blob {
    None => serde_json::Value::Object(serde_json::Map::new()),
    Some(s) => serde_json::from_str(&s)
      .unwrap_or(serde_json::Value::String(s)),
  }
}

// ─── Vector ──────────────────────────────────────────────────────────────────

pub fn encode_vector(vector: Option<&[f32]>) -> Result<Option<String>> {
  vector
    .map(|v| serde_json::to_string(v).map_err(Error::Json))
    .transpose()
}

pub fn decode_vector(blob: Option<&str>) -> Result<Option<Vec<f32>>> {
  blob
    .map(|s| serde_json::from_str(s).map_err(Error::Json))
    .transpose()
}

// ─── Row type ────────────────────────────────────────────────────────────────

/// Raw strings read directly from one catalog row.
pub struct RawCatalog {
  pub id:         String,
  pub title:      String,
  pub author:     String,
  pub url:        String,
  pub tags:       String,
  pub locations:  String,
  pub created_at: String,
  pub updated_at: String,
  pub markdown:   String,
  pub properties: Option<String>,
  pub vector:     Option<String>,
}

impl RawCatalog {
  /// Extract from a row selected with [`COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      title:      row.get(1)?,
      author:     row.get(2)?,
      url:        row.get(3)?,
      tags:       row.get(4)?,
      locations:  row.get(5)?,
      created_at: row.get(6)?,
      updated_at: row.get(7)?,
      markdown:   row.get(8)?,
      properties: row.get(9)?,
      vector:     row.get(10)?,
    })
  }

  pub fn into_catalog(self) -> Result<Catalog> {
    Ok(Catalog {
      id:         decode_uuid(&self.id)?,
      title:      self.title,
      author:     self.author,
      url:        self.url,
      tags:       decode_string_list(&self.tags)?,
      locations:  decode_string_list(&self.locations)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
      markdown:   self.markdown,
      properties: decode_properties(self.properties),
      vector:     decode_vector(self.vector.as_deref())?,
    })
  }
}
