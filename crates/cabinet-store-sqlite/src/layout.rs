//! Tenant namespace resolution — mapping `(org, group, user)` to a physical
//! database file and table, and the connection pool that serves it.
//!
//! The backing mode is chosen once at startup from configuration and never
//! re-inspected per call; callers of the store see no distinction.

use std::{collections::HashMap, path::PathBuf, time::Duration};

use cabinet_core::tenant::TenantId;
use tokio::sync::Mutex;
use tokio_rusqlite::Connection;

use crate::{Error, Result, schema};

// ─── Layout ──────────────────────────────────────────────────────────────────

/// Where a tenant's rows physically live.
#[derive(Debug, Clone)]
pub enum TenantLayout {
  /// One database file per organization (`{dir}/{org}.db`), one table per
  /// `(group, user)` pair inside it. Selected when a central org-database
  /// directory is configured.
  Consolidated { dir: PathBuf },

  /// One database file per `{data_dir}/{org}/{group}.db` path, one table
  /// per user inside it. The default local mode.
  Scattered { data_dir: PathBuf },

  /// A single shared in-memory database; namespaces become fully-qualified
  /// table names. Backs tests.
  Memory,
}

impl TenantLayout {
  /// The pool key for this tenant's database. `None` means the in-memory
  /// database.
  pub(crate) fn database_path(&self, tenant: &TenantId) -> Option<PathBuf> {
    match self {
      TenantLayout::Consolidated { dir } => {
        Some(dir.join(format!("{}.db", tenant.org())))
      }
      TenantLayout::Scattered { data_dir } => Some(
        data_dir
          .join(tenant.org())
          .join(format!("{}.db", tenant.group())),
      ),
      TenantLayout::Memory => None,
    }
  }

  /// The table name for this tenant within its database. Segments were
  /// validated at `TenantId` construction; the store still double-quotes
  /// the result in every statement.
  pub(crate) fn table_name(&self, tenant: &TenantId) -> String {
    match self {
      TenantLayout::Consolidated { .. } => {
        format!("{}__{}", tenant.group(), tenant.user())
      }
      TenantLayout::Scattered { .. } => tenant.user().to_string(),
      TenantLayout::Memory => {
        format!("{}__{}__{}", tenant.org(), tenant.group(), tenant.user())
      }
    }
  }
}

// ─── Pool ────────────────────────────────────────────────────────────────────

/// One cached [`Connection`] per database file.
///
/// `tokio_rusqlite` connections are cheaply clonable handles onto a
/// dedicated thread, so caching one per file serializes same-tenant writes
/// while requests for different tenants proceed independently.
pub(crate) struct ConnectionPool {
  acquire_timeout: Duration,
  conns:           Mutex<HashMap<Option<PathBuf>, Connection>>,
}

impl ConnectionPool {
  pub(crate) fn new(acquire_timeout: Duration) -> Self {
    Self {
      acquire_timeout,
      conns: Mutex::new(HashMap::new()),
    }
  }

  /// Acquire the connection for `path`, opening it on first use. Bounded by
  /// the configured deadline; expiry surfaces as [`Error::Unavailable`].
  pub(crate) async fn acquire(&self, path: Option<PathBuf>) -> Result<Connection> {
    tokio::time::timeout(self.acquire_timeout, self.acquire_inner(path))
      .await
      .map_err(|_| {
        Error::Unavailable(format!(
          "connection acquisition timed out after {:?}",
          self.acquire_timeout
        ))
      })?
  }

  async fn acquire_inner(&self, path: Option<PathBuf>) -> Result<Connection> {
    let mut conns = self.conns.lock().await;
    if let Some(conn) = conns.get(&path) {
      return Ok(conn.clone());
    }

    let conn = match &path {
      Some(file) => {
        if let Some(parent) = file.parent() {
          std::fs::create_dir_all(parent)
            .map_err(|e| Error::Unavailable(format!("create {parent:?}: {e}")))?;
        }
        tracing::debug!(path = %file.display(), "opening tenant database");
        Connection::open(file)
          .await
          .map_err(|e| Error::Unavailable(format!("open {file:?}: {e}")))?
      }
      None => Connection::open_in_memory()
        .await
        .map_err(|e| Error::Unavailable(format!("open in-memory: {e}")))?,
    };

    conn
      .call(|conn| {
        conn.execute_batch(schema::PRAGMAS)?;
        Ok(())
      })
      .await?;

    conns.insert(path, conn.clone());
    Ok(conn)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn tenant() -> TenantId {
    TenantId::new("acme", "research", "alice").unwrap()
  }

  #[test]
  fn consolidated_layout_keys_by_organization() {
    let layout = TenantLayout::Consolidated { dir: PathBuf::from("/srv/orgs") };
    assert_eq!(
      layout.database_path(&tenant()),
      Some(PathBuf::from("/srv/orgs/acme.db"))
    );
    assert_eq!(layout.table_name(&tenant()), "research__alice");
  }

  #[test]
  fn scattered_layout_keys_by_org_and_group_path() {
    let layout =
      TenantLayout::Scattered { data_dir: PathBuf::from("/var/cabinet") };
    assert_eq!(
      layout.database_path(&tenant()),
      Some(PathBuf::from("/var/cabinet/acme/research.db"))
    );
    assert_eq!(layout.table_name(&tenant()), "alice");
  }

  #[test]
  fn memory_layout_qualifies_the_table_with_every_segment() {
    let layout = TenantLayout::Memory;
    assert_eq!(layout.database_path(&tenant()), None);
    assert_eq!(layout.table_name(&tenant()), "acme__research__alice");
  }
}
