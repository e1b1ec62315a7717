//! The `CatalogStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `cabinet-store-sqlite`). Higher layers depend on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  catalog::{Catalog, CatalogPatch, NewCatalog},
  tenant::TenantId,
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`CatalogStore::search`].
///
/// Both filter groups are optional; with neither supplied the search lists
/// the whole namespace. Tag matching is membership of ANY supplied tag (OR);
/// the two groups combine with AND.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
  /// Match rows whose tag array contains any of these.
  pub tags: Vec<String>,
  /// Case-insensitive substring over `title` OR `markdown`.
  pub text: Option<String>,
}

// ─── Failure classification ──────────────────────────────────────────────────

/// Implemented by backend error types so transport layers can distinguish
/// transient acquisition failures (retryable, "service unavailable") from
/// engine rejections without knowing the concrete backend.
pub trait StorageFailure {
  fn is_unavailable(&self) -> bool { false }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Cabinet storage backend.
///
/// Each method is a standalone operation against one tenant namespace; the
/// backend provisions the namespace idempotently before touching it. Absence
/// is reported in-band (`Option` / `bool`), never as an error.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait CatalogStore: Send + Sync {
  type Error: std::error::Error + StorageFailure + Send + Sync + 'static;

  /// Insert a new record and return the canonical stored form (re-read
  /// after insert). Assigns `id` and timestamps when the input omits them.
  fn create<'a>(
    &'a self,
    tenant: &'a TenantId,
    input: NewCatalog,
  ) -> impl Future<Output = Result<Catalog, Self::Error>> + Send + 'a;

  /// Point lookup by primary key. `None` if no such row.
  fn get<'a>(
    &'a self,
    tenant: &'a TenantId,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Catalog>, Self::Error>> + Send + 'a;

  /// Partial update: only supplied fields overwrite, `updated_at` is always
  /// refreshed. Returns the updated row, or `None` if `id` does not exist.
  fn update<'a>(
    &'a self,
    tenant: &'a TenantId,
    id: Uuid,
    patch: CatalogPatch,
  ) -> impl Future<Output = Result<Option<Catalog>, Self::Error>> + Send + 'a;

  /// Delete by id, reporting whether a row was actually removed. Idempotent:
  /// a second delete of the same id returns `false`.
  fn delete<'a>(
    &'a self,
    tenant: &'a TenantId,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Filtered search; see [`SearchQuery`]. Results are ordered by
  /// `updated_at` descending.
  fn search<'a>(
    &'a self,
    tenant: &'a TenantId,
    query: &'a SearchQuery,
  ) -> impl Future<Output = Result<Vec<Catalog>, Self::Error>> + Send + 'a;

  /// Cosine-similarity search over rows that carry a vector, most similar
  /// first. Rows without a vector are skipped.
  fn vector_search<'a>(
    &'a self,
    tenant: &'a TenantId,
    vector: &'a [f32],
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Catalog>, Self::Error>> + Send + 'a;
}
