//! JSON REST API for Cabinet.
//!
//! Exposes an axum [`Router`] backed by any [`cabinet_core::store::CatalogStore`].
//! TLS and transport concerns are the caller's responsibility; there is no
//! auth layer — tenant isolation is namespace-based by design.

pub mod error;
pub mod handlers;
pub mod service;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use cabinet_core::store::CatalogStore;
use cabinet_store_sqlite::TenantLayout;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use service::CatalogService;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialized from `config.toml` and
/// `CABINET_*` environment overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  /// Root of the scattered per-tenant database files.
  #[serde(default = "default_data_dir")]
  pub data_dir:           PathBuf,
  /// When set, selects the consolidated layout: one database file per
  /// organization under this directory.
  #[serde(default)]
  pub org_database_dir:   Option<PathBuf>,
  #[serde(default = "default_acquire_timeout_ms")]
  pub acquire_timeout_ms: u64,
  #[serde(default = "default_fetch_timeout_secs")]
  pub fetch_timeout_secs: u64,
  /// Attach token-hash embeddings to created records.
  #[serde(default = "default_embedding")]
  pub embedding:          bool,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8603 }
fn default_data_dir() -> PathBuf { PathBuf::from("data") }
fn default_acquire_timeout_ms() -> u64 { 5000 }
fn default_fetch_timeout_secs() -> u64 { 30 }
fn default_embedding() -> bool { true }

impl ServerConfig {
  /// The storage layout implied by this configuration, decided once at
  /// startup.
  pub fn layout(&self) -> TenantLayout {
    match &self.org_database_dir {
      Some(dir) => TenantLayout::Consolidated { dir: dir.clone() },
      None => TenantLayout::Scattered { data_dir: self.data_dir.clone() },
    }
  }
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S: CatalogStore> {
  pub service: Arc<CatalogService<S>>,
}

impl<S: CatalogStore> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { service: self.service.clone() }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the catalog API.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: CatalogStore + 'static,
{
  use handlers::{catalogs, ingest, search};

  Router::new()
    .route("/from_url", get(ingest::markdown_preview::<S>))
    .route("/{org}/{group}/{user}/", post(catalogs::create::<S>))
    .route(
      "/{org}/{group}/{user}/new",
      post(ingest::upload_markdown::<S>).get(ingest::create_from_url::<S>),
    )
    .route("/{org}/{group}/{user}/search", get(search::search::<S>))
    .route(
      "/{org}/{group}/{user}/vector-search",
      get(search::vector_search::<S>),
    )
    .route(
      "/{org}/{group}/{user}/{id}",
      get(catalogs::get_one::<S>)
        .put(catalogs::update::<S>)
        .delete(catalogs::delete_one::<S>),
    )
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::{sync::Arc, time::Duration};

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use cabinet_embed::TokenHashEmbedder;
  use cabinet_ingest::webpage::WebFetcher;
  use cabinet_store_sqlite::SqliteCatalogStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use super::*;

  fn make_state() -> AppState<SqliteCatalogStore> {
    let store = Arc::new(SqliteCatalogStore::in_memory());
    let fetcher = WebFetcher::new(Duration::from_secs(1)).unwrap();
    let embedder: Arc<dyn cabinet_core::embed::Embedder> =
      Arc::new(TokenHashEmbedder::new());
    AppState {
      service: Arc::new(CatalogService::new(store, fetcher, Some(embedder))),
    }
  }

  async fn send(
    state: AppState<SqliteCatalogStore>,
    method: &str,
    uri: &str,
    content_type: Option<&str>,
    body: &str,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(ct) = content_type {
      builder = builder.header(header::CONTENT_TYPE, ct);
    }
    let req = builder.body(Body::from(body.to_string())).unwrap();
    router(state).oneshot(req).await.unwrap()
  }

  async fn send_json(
    state: AppState<SqliteCatalogStore>,
    method: &str,
    uri: &str,
    body: Value,
  ) -> axum::response::Response {
    send(state, method, uri, Some("application/json"), &body.to_string()).await
  }

  async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  fn draft_json(title: &str) -> Value {
    json!({
      "title": title,
      "author": "A. Writer",
      "url": "https://example.com/doc",
      "tags": ["rust"],
      "markdown": "Ownership and borrowing."
    })
  }

  // ── Create ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_returns_201_with_the_stored_record() {
    let state = make_state();
    let resp =
      send_json(state, "POST", "/acme/research/alice/", draft_json("One")).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body = json_body(resp).await;
    assert_eq!(body["title"], "One");
    assert!(body["id"].is_string());
    assert_eq!(body["created_at"], body["updated_at"]);
    // The embedder attached a similarity vector to the markdown body.
    assert!(body["vector"].is_array());
  }

  #[tokio::test]
  async fn create_with_empty_title_is_rejected() {
    let state = make_state();
    let resp = send_json(
      state,
      "POST",
      "/acme/research/alice/",
      json!({"title": "  ", "url": "https://x"}),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(resp).await["error"].is_string());
  }

  #[tokio::test]
  async fn invalid_tenant_segment_is_rejected() {
    let state = make_state();
    let resp = send_json(
      state,
      "POST",
      "/acme/bad-group/alice/",
      draft_json("X"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  // ── Get / update / delete ─────────────────────────────────────────────────

  #[tokio::test]
  async fn get_roundtrip_and_404() {
    let state = make_state();
    let created = json_body(
      send_json(
        state.clone(),
        "POST",
        "/acme/research/alice/",
        draft_json("Fetch me"),
      )
      .await,
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();

    let resp = send(
      state.clone(),
      "GET",
      &format!("/acme/research/alice/{id}"),
      None,
      "",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["title"], "Fetch me");

    let missing = uuid::Uuid::new_v4();
    let resp = send(
      state,
      "GET",
      &format!("/acme/research/alice/{missing}"),
      None,
      "",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn put_updates_only_supplied_fields() {
    let state = make_state();
    let created = json_body(
      send_json(
        state.clone(),
        "POST",
        "/acme/research/alice/",
        draft_json("Before"),
      )
      .await,
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();

    let resp = send_json(
      state.clone(),
      "PUT",
      &format!("/acme/research/alice/{id}"),
      json!({"title": "After"}),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated = json_body(resp).await;
    assert_eq!(updated["title"], "After");
    assert_eq!(updated["author"], created["author"]);
    assert_eq!(updated["created_at"], created["created_at"]);

    let missing = uuid::Uuid::new_v4();
    let resp = send_json(
      state,
      "PUT",
      &format!("/acme/research/alice/{missing}"),
      json!({"title": "X"}),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn delete_returns_204_then_404() {
    let state = make_state();
    let created = json_body(
      send_json(
        state.clone(),
        "POST",
        "/acme/research/alice/",
        draft_json("Doomed"),
      )
      .await,
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();
    let uri = format!("/acme/research/alice/{id}");

    let resp = send(state.clone(), "DELETE", &uri, None, "").await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = send(state.clone(), "GET", &uri, None, "").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = send(state, "DELETE", &uri, None, "").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── Search ────────────────────────────────────────────────────────────────

  async fn seed_two(state: &AppState<SqliteCatalogStore>) {
    send_json(
      state.clone(),
      "POST",
      "/acme/research/alice/",
      draft_json("Rust Patterns"),
    )
    .await;
    send_json(
      state.clone(),
      "POST",
      "/acme/research/alice/",
      json!({
        "title": "Sourdough Notes",
        "url": "https://example.com/bread",
        "tags": ["baking"],
        "markdown": "Hydration ratios and scoring."
      }),
    )
    .await;
  }

  #[tokio::test]
  async fn search_without_params_lists_everything() {
    let state = make_state();
    seed_two(&state).await;

    let resp =
      send(state, "GET", "/acme/research/alice/search", None, "").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await.as_array().unwrap().len(), 2);
  }

  #[tokio::test]
  async fn search_by_repeated_tags_is_a_union() {
    let state = make_state();
    seed_two(&state).await;

    let resp = send(
      state.clone(),
      "GET",
      "/acme/research/alice/search?tag=rust",
      None,
      "",
    )
    .await;
    let hits = json_body(resp).await;
    assert_eq!(hits.as_array().unwrap().len(), 1);
    assert_eq!(hits[0]["title"], "Rust Patterns");

    let resp = send(
      state,
      "GET",
      "/acme/research/alice/search?tag=rust&tag=baking",
      None,
      "",
    )
    .await;
    assert_eq!(json_body(resp).await.as_array().unwrap().len(), 2);
  }

  #[tokio::test]
  async fn search_text_matches_case_insensitively() {
    let state = make_state();
    seed_two(&state).await;

    let resp = send(
      state,
      "GET",
      "/acme/research/alice/search?q=OWNERSHIP",
      None,
      "",
    )
    .await;
    let hits = json_body(resp).await;
    assert_eq!(hits.as_array().unwrap().len(), 1);
    assert_eq!(hits[0]["title"], "Rust Patterns");
  }

  #[tokio::test]
  async fn empty_text_query_behaves_like_no_query() {
    let state = make_state();
    seed_two(&state).await;

    let resp = send(
      state,
      "GET",
      "/acme/research/alice/search?q=",
      None,
      "",
    )
    .await;
    assert_eq!(json_body(resp).await.as_array().unwrap().len(), 2);
  }

  // ── Markdown ingestion ────────────────────────────────────────────────────

  const DOC: &str = "---\n\
    title: Field Notes\n\
    author: A. Naturalist\n\
    url: https://example.com/notes\n\
    tags:\n\
    \x20 - outdoors\n\
    season: spring\n\
    ---\n\
    # Day One\n\
    \n\
    Saw a heron.\n";

  #[tokio::test]
  async fn markdown_upload_creates_a_record() {
    let state = make_state();
    let resp = send(
      state,
      "POST",
      "/acme/research/alice/new",
      Some("text/markdown"),
      DOC,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body = json_body(resp).await;
    assert_eq!(body["title"], "Field Notes");
    assert_eq!(body["tags"], json!(["outdoors"]));
    assert!(body["markdown"].as_str().unwrap().starts_with("# Day One"));
    // The full frontmatter map is preserved, recognized keys included.
    assert_eq!(body["properties"]["season"], "spring");
    assert_eq!(body["properties"]["title"], "Field Notes");
  }

  #[tokio::test]
  async fn markdown_without_frontmatter_is_rejected() {
    let state = make_state();
    let resp = send(
      state.clone(),
      "POST",
      "/acme/research/alice/new",
      Some("text/markdown"),
      "# No frontmatter here\n",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // And nothing was created.
    let resp =
      send(state, "GET", "/acme/research/alice/search", None, "").await;
    assert!(json_body(resp).await.as_array().unwrap().is_empty());
  }

  #[tokio::test]
  async fn unsupported_upload_content_type_is_rejected() {
    let state = make_state();
    let resp = send(
      state,
      "POST",
      "/acme/research/alice/new",
      Some("application/json"),
      "{}",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn multipart_upload_uses_filename_as_title_fallback() {
    let state = make_state();
    let doc = "---\nauthor: A\n---\nbody\n";
    let boundary = "XCABINETBOUNDARY";
    let body = format!(
      "--{boundary}\r\n\
       Content-Disposition: form-data; name=\"file\"; filename=\"notes.md\"\r\n\
       Content-Type: text/markdown\r\n\r\n\
       {doc}\r\n\
       --{boundary}--\r\n"
    );

    let resp = send(
      state,
      "POST",
      "/acme/research/alice/new",
      Some(&format!("multipart/form-data; boundary={boundary}")),
      &body,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(json_body(resp).await["title"], "notes.md");
  }

  #[tokio::test]
  async fn from_url_without_url_param_is_rejected() {
    let state = make_state();
    let resp = send(state, "GET", "/from_url", None, "").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  // ── Vector search ─────────────────────────────────────────────────────────

  #[tokio::test]
  async fn vector_search_ranks_by_similarity() {
    let state = make_state();
    seed_two(&state).await;

    let resp = send(
      state,
      "GET",
      "/acme/research/alice/vector-search?q=ownership%20and%20borrowing",
      None,
      "",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let hits = json_body(resp).await;
    assert!(!hits.as_array().unwrap().is_empty());
    assert_eq!(hits[0]["title"], "Rust Patterns");
  }

  // ── Isolation ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn tenants_are_isolated_over_http() {
    let state = make_state();
    send_json(
      state.clone(),
      "POST",
      "/org_a/group_a/user_a/",
      draft_json("A only"),
    )
    .await;

    let resp =
      send(state, "GET", "/org_b/group_b/user_b/search", None, "").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(json_body(resp).await.as_array().unwrap().is_empty());
  }

  // ── Configuration ─────────────────────────────────────────────────────────

  #[test]
  fn config_defaults_select_the_scattered_layout() {
    let cfg: ServerConfig = serde_json::from_str("{}").unwrap();
    assert!(matches!(cfg.layout(), TenantLayout::Scattered { .. }));
    assert_eq!(cfg.acquire_timeout_ms, 5000);

    let cfg: ServerConfig =
      serde_json::from_str(r#"{"org_database_dir": "/var/cabinet"}"#).unwrap();
    assert!(matches!(cfg.layout(), TenantLayout::Consolidated { .. }));
  }
}
