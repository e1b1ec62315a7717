//! Handlers for the catalog CRUD endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/{org}/{group}/{user}/` | JSON body → 201 |
//! | `GET`    | `/{org}/{group}/{user}/{id}` | 404 if not found |
//! | `PUT`    | `/{org}/{group}/{user}/{id}` | partial update → 200 |
//! | `DELETE` | `/{org}/{group}/{user}/{id}` | → 204 |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use cabinet_core::{
  catalog::{Catalog, CatalogPatch, NewCatalog},
  store::CatalogStore,
};
use uuid::Uuid;

use crate::{AppState, error::ApiError, handlers::tenant_from_path};

/// `POST /{org}/{group}/{user}/`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Path((org, group, user)): Path<(String, String, String)>,
  Json(body): Json<NewCatalog>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CatalogStore + 'static,
{
  let tenant = tenant_from_path(org, group, user)?;
  let catalog = state.service.create(&tenant, body).await?;
  Ok((StatusCode::CREATED, Json(catalog)))
}

/// `GET /{org}/{group}/{user}/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path((org, group, user, id)): Path<(String, String, String, Uuid)>,
) -> Result<Json<Catalog>, ApiError>
where
  S: CatalogStore + 'static,
{
  let tenant = tenant_from_path(org, group, user)?;
  let catalog = state
    .service
    .get(&tenant, id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("catalog {id} not found")))?;
  Ok(Json(catalog))
}

/// `PUT /{org}/{group}/{user}/{id}` — body: partial fields.
pub async fn update<S>(
  State(state): State<AppState<S>>,
  Path((org, group, user, id)): Path<(String, String, String, Uuid)>,
  Json(patch): Json<CatalogPatch>,
) -> Result<Json<Catalog>, ApiError>
where
  S: CatalogStore + 'static,
{
  let tenant = tenant_from_path(org, group, user)?;
  let catalog = state
    .service
    .update(&tenant, id, patch)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("catalog {id} not found")))?;
  Ok(Json(catalog))
}

/// `DELETE /{org}/{group}/{user}/{id}`
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  Path((org, group, user, id)): Path<(String, String, String, Uuid)>,
) -> Result<StatusCode, ApiError>
where
  S: CatalogStore + 'static,
{
  let tenant = tenant_from_path(org, group, user)?;
  if state.service.delete(&tenant, id).await? {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("catalog {id} not found")))
  }
}
