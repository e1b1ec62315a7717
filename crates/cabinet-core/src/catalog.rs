//! Catalog record types — the persisted entity and its write-side inputs.
//!
//! `Catalog` is the canonical stored form; `NewCatalog` is the creation
//! input (ids and timestamps are server-assigned when absent); `CatalogPatch`
//! is a partial update where [`Patch`] distinguishes "field omitted" from
//! "field supplied".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Open key→value metadata attached to a catalog record, opaque to the store
/// except for serialization.
pub type Properties = serde_json::Map<String, serde_json::Value>;

// ─── Catalog ─────────────────────────────────────────────────────────────────

/// One cataloged document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
  pub id:         Uuid,
  pub title:      String,
  pub author:     String,
  /// Canonical source URL. Stored as a string; well-formedness is the
  /// service layer's concern, not the store's.
  pub url:        String,
  pub tags:       Vec<String>,
  /// URLs or paths where the document can be found.
  pub locations:  Vec<String>,
  /// Set once at creation, never modified afterwards.
  pub created_at: DateTime<Utc>,
  /// Reset by the store on every successful mutation.
  pub updated_at: DateTime<Utc>,
  /// The full body text.
  pub markdown:   String,
  /// Arbitrarily-nested frontmatter/caller metadata. A row whose stored
  /// blob cannot be parsed decodes to a single JSON string value rather
  /// than failing the read.
  pub properties: serde_json::Value,
  /// Opaque similarity key set by the service layer; absent unless an
  /// embedder produced one.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub vector:     Option<Vec<f32>>,
}

// ─── NewCatalog ──────────────────────────────────────────────────────────────

/// Input to [`crate::store::CatalogStore::create`].
///
/// `id` is minted by the service (or the store, as a fallback) when `None`;
/// it is never accepted from the wire. Timestamps default to "now" when
/// absent — ingestion adapters may carry explicit values from frontmatter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCatalog {
  #[serde(skip)]
  pub id:         Option<Uuid>,
  pub title:      String,
  #[serde(default)]
  pub author:     String,
  pub url:        String,
  #[serde(default)]
  pub tags:       Vec<String>,
  #[serde(default)]
  pub locations:  Vec<String>,
  #[serde(default)]
  pub markdown:   String,
  #[serde(default)]
  pub properties: serde_json::Value,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub updated_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub vector:     Option<Vec<f32>>,
}

// ─── Patch ───────────────────────────────────────────────────────────────────

/// A field in a partial-update payload.
///
/// Deserialization maps a missing key to [`Patch::Absent`] (via
/// `#[serde(default)]` on the containing struct) and any present value —
/// including an explicit empty string, empty array, or `null` where `T` is
/// an `Option` — to [`Patch::Set`]. Only `Absent` fields are skipped by the
/// store's SET clause.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Patch<T> {
  #[default]
  Absent,
  Set(T),
}

impl<T> Patch<T> {
  pub fn is_absent(&self) -> bool { matches!(self, Patch::Absent) }

  pub fn as_set(&self) -> Option<&T> {
    match self {
      Patch::Absent => None,
      Patch::Set(v) => Some(v),
    }
  }

  pub fn into_set(self) -> Option<T> {
    match self {
      Patch::Absent => None,
      Patch::Set(v) => Some(v),
    }
  }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    T::deserialize(deserializer).map(Patch::Set)
  }
}

// ─── CatalogPatch ────────────────────────────────────────────────────────────

/// Input to [`crate::store::CatalogStore::update`].
///
/// `updated_at` is always overwritten by the store and is therefore not a
/// patchable field; `created_at` and `id` are immutable by contract.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogPatch {
  #[serde(default)]
  pub title:      Patch<String>,
  #[serde(default)]
  pub author:     Patch<String>,
  #[serde(default)]
  pub url:        Patch<String>,
  #[serde(default)]
  pub tags:       Patch<Vec<String>>,
  #[serde(default)]
  pub locations:  Patch<Vec<String>>,
  #[serde(default)]
  pub markdown:   Patch<String>,
  /// `"properties": null` clears the column; omission leaves it untouched.
  #[serde(default)]
  pub properties: Patch<Option<Properties>>,
  #[serde(default)]
  pub vector:     Patch<Option<Vec<f32>>>,
}

impl CatalogPatch {
  /// True when no field was supplied at all. The store still refreshes
  /// `updated_at` for an empty patch.
  pub fn is_empty(&self) -> bool {
    self.title.is_absent()
      && self.author.is_absent()
      && self.url.is_absent()
      && self.tags.is_absent()
      && self.locations.is_absent()
      && self.markdown.is_absent()
      && self.properties.is_absent()
      && self.vector.is_absent()
  }
}
