//! `CatalogService` — orchestration between the HTTP layer, the ingestion
//! adapters, the optional embedder, and the catalog store.
//!
//! The service owns id minting and timestamp defaults; the store persists
//! what it is given. Embedding is the one tolerated failure: a record is
//! always created, with or without a vector.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use cabinet_core::{
  catalog::{Catalog, CatalogPatch, NewCatalog, Patch},
  embed::Embedder,
  store::{CatalogStore, SearchQuery},
  tenant::TenantId,
};
use cabinet_ingest::{frontmatter, frontmatter::Metadata, webpage::WebFetcher};

use crate::error::ApiError;

/// Default result count for vector search.
pub const DEFAULT_VECTOR_SEARCH_LIMIT: usize = 10;

pub struct CatalogService<S> {
  store:    Arc<S>,
  fetcher:  WebFetcher,
  embedder: Option<Arc<dyn Embedder>>,
}

impl<S: CatalogStore> CatalogService<S> {
  pub fn new(
    store: Arc<S>,
    fetcher: WebFetcher,
    embedder: Option<Arc<dyn Embedder>>,
  ) -> Self {
    Self { store, fetcher, embedder }
  }

  // ── Creation ──────────────────────────────────────────────────────────────

  /// Create from caller-supplied fields. Mints the id, defaults both
  /// timestamps to now, and attaches an embedding of the body when one can
  /// be produced.
  pub async fn create(
    &self,
    tenant: &TenantId,
    mut input: NewCatalog,
  ) -> Result<Catalog, ApiError> {
    if input.title.trim().is_empty() {
      return Err(ApiError::BadRequest("title must not be empty".to_string()));
    }

    input.id.get_or_insert_with(Uuid::new_v4);
    let now = Utc::now();
    input.created_at.get_or_insert(now);
    input.updated_at.get_or_insert(now);

    if input.vector.is_none() && !input.markdown.is_empty() {
      input.vector = self.embed(&input.markdown);
    }

    self
      .store
      .create(tenant, input)
      .await
      .map_err(ApiError::from_store)
  }

  /// Create from a raw markdown document with YAML frontmatter.
  ///
  /// Recognized metadata keys map onto catalog fields; the entire metadata
  /// map — recognized keys included — is preserved in `properties`.
  pub async fn create_from_markdown(
    &self,
    tenant: &TenantId,
    text: &str,
    fallback_title: Option<&str>,
  ) -> Result<Catalog, ApiError> {
    let doc = frontmatter::parse(text).map_err(ApiError::from_ingest)?;
    let input = catalog_from_parts(doc.metadata, doc.body, fallback_title);
    self.create(tenant, input).await
  }

  /// Create from a web URL: fetch, convert to markdown, synthesize minimal
  /// metadata, then proceed exactly as the markdown path.
  pub async fn create_from_url(
    &self,
    tenant: &TenantId,
    url: &str,
  ) -> Result<Catalog, ApiError> {
    let page = self
      .fetcher
      .fetch(url)
      .await
      .map_err(ApiError::from_ingest)?;
    let metadata = url_metadata(url, page.title.as_deref());
    let input = catalog_from_parts(metadata, page.markdown, None);
    self.create(tenant, input).await
  }

  /// Fetch a URL and return the composed frontmatter document without
  /// persisting anything.
  pub async fn markdown_from_url(&self, url: &str) -> Result<String, ApiError> {
    let page = self
      .fetcher
      .fetch(url)
      .await
      .map_err(ApiError::from_ingest)?;
    let metadata = url_metadata(url, page.title.as_deref());
    frontmatter::compose(&metadata, &page.markdown)
      .map_err(ApiError::from_ingest)
  }

  // ── Reads and mutation ────────────────────────────────────────────────────

  pub async fn get(
    &self,
    tenant: &TenantId,
    id: Uuid,
  ) -> Result<Option<Catalog>, ApiError> {
    self.store.get(tenant, id).await.map_err(ApiError::from_store)
  }

  /// Partial update. A patch that replaces the markdown body re-embeds it
  /// unless the caller supplied a vector of their own.
  pub async fn update(
    &self,
    tenant: &TenantId,
    id: Uuid,
    mut patch: CatalogPatch,
  ) -> Result<Option<Catalog>, ApiError> {
    if let Patch::Set(markdown) = &patch.markdown {
      if patch.vector.is_absent() && !markdown.is_empty() {
        if let Some(vector) = self.embed(markdown) {
          patch.vector = Patch::Set(Some(vector));
        }
      }
    }
    self
      .store
      .update(tenant, id, patch)
      .await
      .map_err(ApiError::from_store)
  }

  pub async fn delete(&self, tenant: &TenantId, id: Uuid) -> Result<bool, ApiError> {
    self
      .store
      .delete(tenant, id)
      .await
      .map_err(ApiError::from_store)
  }

  // ── Search ────────────────────────────────────────────────────────────────

  /// Filtered search. Empty strings normalize to "no filter"; no filters at
  /// all lists the whole namespace.
  pub async fn search(
    &self,
    tenant: &TenantId,
    tags: Vec<String>,
    text: Option<String>,
  ) -> Result<Vec<Catalog>, ApiError> {
    let query = SearchQuery {
      tags: tags.into_iter().filter(|t| !t.is_empty()).collect(),
      text: text.filter(|t| !t.trim().is_empty()),
    };
    self
      .store
      .search(tenant, &query)
      .await
      .map_err(ApiError::from_store)
  }

  /// Similarity search over the query text's embedding. Falls back to plain
  /// text search when no vector can be produced.
  pub async fn vector_search(
    &self,
    tenant: &TenantId,
    text: &str,
    limit: Option<usize>,
  ) -> Result<Vec<Catalog>, ApiError> {
    let limit = limit.unwrap_or(DEFAULT_VECTOR_SEARCH_LIMIT);
    match self.embed(text) {
      Some(vector) => self
        .store
        .vector_search(tenant, &vector, limit)
        .await
        .map_err(ApiError::from_store),
      None => {
        debug!("no query vector; falling back to text search");
        self.search(tenant, Vec::new(), Some(text.to_string())).await
      }
    }
  }

  fn embed(&self, text: &str) -> Option<Vec<f32>> {
    self.embedder.as_ref().and_then(|e| e.embed(text))
  }
}

// ─── Field mapping ───────────────────────────────────────────────────────────

/// Map a parsed metadata map and body onto a creation input.
///
/// Missing `title` falls back to the supplied filename, then to
/// `"Untitled"`. The full metadata map rides along in `properties` so
/// custom frontmatter fields survive losslessly.
fn catalog_from_parts(
  metadata: Metadata,
  body: String,
  fallback_title: Option<&str>,
) -> NewCatalog {
  let title = non_empty_str(metadata.get("title"))
    .or(fallback_title.filter(|t| !t.trim().is_empty()))
    .unwrap_or("Untitled")
    .to_string();

  NewCatalog {
    id: None,
    title,
    author: non_empty_str(metadata.get("author")).unwrap_or("").to_string(),
    url: non_empty_str(metadata.get("url")).unwrap_or("").to_string(),
    tags: string_list(metadata.get("tags")),
    locations: string_list(metadata.get("locations")),
    markdown: body,
    created_at: metadata.get("created_at").and_then(parse_timestamp),
    updated_at: metadata.get("updated_at").and_then(parse_timestamp),
    properties: serde_json::Value::Object(metadata),
    vector: None,
  }
}

/// The minimal metadata map synthesized for a fetched URL.
fn url_metadata(url: &str, page_title: Option<&str>) -> Metadata {
  let title = page_title
    .filter(|t| !t.trim().is_empty())
    .map(str::to_string)
    .or_else(|| last_path_segment(url))
    .unwrap_or_else(|| "Untitled".to_string());
  let now = Utc::now().to_rfc3339();

  let mut metadata = Metadata::new();
  metadata.insert("title".into(), json!(title));
  metadata.insert("author".into(), json!(""));
  metadata.insert("url".into(), json!(url));
  metadata.insert("tags".into(), json!([]));
  metadata.insert("locations".into(), json!([url]));
  metadata.insert("created_at".into(), json!(now));
  metadata.insert("updated_at".into(), json!(now));
  metadata
}

fn non_empty_str(value: Option<&serde_json::Value>) -> Option<&str> {
  value.and_then(|v| v.as_str()).filter(|s| !s.trim().is_empty())
}

fn string_list(value: Option<&serde_json::Value>) -> Vec<String> {
  value
    .and_then(|v| v.as_array())
    .map(|items| {
      items
        .iter()
        .filter_map(|v| v.as_str())
        .map(str::to_string)
        .collect()
    })
    .unwrap_or_default()
}

/// Frontmatter timestamps arrive as RFC 3339 strings or bare dates.
fn parse_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
  let s = value.as_str()?;
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }
  let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
  let midnight = date.and_time(NaiveTime::MIN);
  Some(Utc.from_utc_datetime(&midnight))
}

fn last_path_segment(url: &str) -> Option<String> {
  url
    .rsplit('/')
    .next()
    .filter(|s| !s.is_empty())
    .map(str::to_string)
}
