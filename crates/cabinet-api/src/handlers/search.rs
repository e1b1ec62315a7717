//! Handlers for `GET /{org}/{group}/{user}/search` and `/vector-search`.
//!
//! `tag` may repeat (`?tag=a&tag=b`, OR'd), so the query string is parsed
//! by hand rather than through a single-valued extractor. No parameters at
//! all lists the whole namespace.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::Uri,
};
use cabinet_core::{catalog::Catalog, store::CatalogStore};
use serde::Deserialize;

use crate::{AppState, error::ApiError, handlers::tenant_from_path};

/// `GET /{org}/{group}/{user}/search[?tag=...&tag=...][&q=...]`
pub async fn search<S>(
  State(state): State<AppState<S>>,
  Path((org, group, user)): Path<(String, String, String)>,
  uri: Uri,
) -> Result<Json<Vec<Catalog>>, ApiError>
where
  S: CatalogStore + 'static,
{
  let tenant = tenant_from_path(org, group, user)?;

  let mut tags: Vec<String> = Vec::new();
  let mut text: Option<String> = None;
  if let Some(query) = uri.query() {
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
      match key.as_ref() {
        "tag" => tags.push(value.into_owned()),
        "q" => text = Some(value.into_owned()),
        _ => {}
      }
    }
  }

  let catalogs = state.service.search(&tenant, tags, text).await?;
  Ok(Json(catalogs))
}

#[derive(Debug, Deserialize)]
pub struct VectorSearchParams {
  pub q:     String,
  pub limit: Option<usize>,
}

/// `GET /{org}/{group}/{user}/vector-search?q=...[&limit=...]`
pub async fn vector_search<S>(
  State(state): State<AppState<S>>,
  Path((org, group, user)): Path<(String, String, String)>,
  Query(params): Query<VectorSearchParams>,
) -> Result<Json<Vec<Catalog>>, ApiError>
where
  S: CatalogStore + 'static,
{
  let tenant = tenant_from_path(org, group, user)?;
  let catalogs = state
    .service
    .vector_search(&tenant, &params.q, params.limit)
    .await?;
  Ok(Json(catalogs))
}
