//! HTTP handlers, grouped by concern.

pub mod catalogs;
pub mod ingest;
pub mod search;

use cabinet_core::tenant::TenantId;

use crate::error::ApiError;

/// Build a validated tenant from path segments; rejection is a 400, never a
/// string that reaches an identifier position.
pub(crate) fn tenant_from_path(
  org: String,
  group: String,
  user: String,
) -> Result<TenantId, ApiError> {
  Ok(TenantId::new(org, group, user)?)
}
