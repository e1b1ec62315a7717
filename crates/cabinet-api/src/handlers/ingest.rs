//! Handlers for the ingestion endpoints: markdown upload and URL capture.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/{org}/{group}/{user}/new` | `text/markdown` body or multipart file |
//! | `GET`  | `/{org}/{group}/{user}/new?url=` | fetch + convert + create |
//! | `GET`  | `/from_url?url=` | fetch + convert, return markdown only |

use axum::{
  Json,
  extract::{FromRequest as _, Multipart, Path, Query, Request, State},
  http::{StatusCode, header},
  response::IntoResponse,
};
use cabinet_core::store::CatalogStore;
use serde::Deserialize;

use crate::{AppState, error::ApiError, handlers::tenant_from_path};

/// Upper bound on uploaded markdown bodies.
const MAX_UPLOAD_BYTES: usize = 8 * 1024 * 1024;

// ─── Markdown upload ─────────────────────────────────────────────────────────

/// `POST /{org}/{group}/{user}/new`
///
/// Accepts either a direct `text/markdown` body or a multipart upload with
/// a file field; anything else is a 400.
pub async fn upload_markdown<S>(
  State(state): State<AppState<S>>,
  Path((org, group, user)): Path<(String, String, String)>,
  req: Request,
) -> Result<impl IntoResponse, ApiError>
where
  S: CatalogStore + 'static,
{
  let tenant = tenant_from_path(org, group, user)?;

  let content_type = req
    .headers()
    .get(header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .unwrap_or("")
    .to_string();

  let (text, filename) = if content_type.starts_with("multipart/form-data") {
    read_multipart(req).await?
  } else if content_type.starts_with("text/markdown") {
    (read_utf8_body(req).await?, None)
  } else {
    return Err(ApiError::BadRequest(
      "expected Content-Type: text/markdown or a multipart file upload"
        .to_string(),
    ));
  };

  let catalog = state
    .service
    .create_from_markdown(&tenant, &text, filename.as_deref())
    .await?;
  Ok((StatusCode::CREATED, Json(catalog)))
}

async fn read_utf8_body(req: Request) -> Result<String, ApiError> {
  let bytes = axum::body::to_bytes(req.into_body(), MAX_UPLOAD_BYTES)
    .await
    .map_err(|_| ApiError::BadRequest("request body too large".to_string()))?;
  String::from_utf8(bytes.to_vec()).map_err(|_| {
    ApiError::BadRequest("markdown content must be UTF-8 encoded".to_string())
  })
}

async fn read_multipart(req: Request) -> Result<(String, Option<String>), ApiError> {
  let mut multipart = Multipart::from_request(req, &())
    .await
    .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?;

  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
  {
    if field.name() == Some("file") || field.file_name().is_some() {
      let filename = field.file_name().map(str::to_string);
      let text = field.text().await.map_err(|_| {
        ApiError::BadRequest("markdown file must be UTF-8 encoded".to_string())
      })?;
      return Ok((text, filename));
    }
  }

  Err(ApiError::BadRequest(
    "multipart upload contains no file field".to_string(),
  ))
}

// ─── URL capture ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UrlParams {
  pub url: String,
}

/// `GET /{org}/{group}/{user}/new?url=...`
pub async fn create_from_url<S>(
  State(state): State<AppState<S>>,
  Path((org, group, user)): Path<(String, String, String)>,
  Query(params): Query<UrlParams>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CatalogStore + 'static,
{
  let tenant = tenant_from_path(org, group, user)?;
  let catalog = state.service.create_from_url(&tenant, &params.url).await?;
  Ok((StatusCode::CREATED, Json(catalog)))
}

/// `GET /from_url?url=...` — conversion preview; nothing is persisted.
pub async fn markdown_preview<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<UrlParams>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CatalogStore + 'static,
{
  let markdown = state.service.markdown_from_url(&params.url).await?;
  Ok((
    [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
    markdown,
  ))
}
