//! [`SqliteCatalogStore`] — the SQLite implementation of [`CatalogStore`].

use std::time::Duration;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, types::Value as SqlValue};
use uuid::Uuid;

use cabinet_core::{
  catalog::{Catalog, CatalogPatch, NewCatalog, Patch},
  store::{CatalogStore, SearchQuery},
  tenant::TenantId,
};

use crate::{
  Error, Result,
  encode::{
    COLUMNS, RawCatalog, encode_dt, encode_properties, encode_string_list,
    encode_uuid, encode_vector,
  },
  layout::{ConnectionPool, TenantLayout},
  schema,
};

/// Default bound on connection acquisition.
const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Cabinet catalog store backed by embedded SQLite files.
///
/// Stateless per call: every operation resolves its tenant namespace
/// (idempotently provisioning the table), executes, and returns. The only
/// held state is the connection pool and the layout chosen at startup.
pub struct SqliteCatalogStore {
  layout: TenantLayout,
  pool:   ConnectionPool,
}

impl SqliteCatalogStore {
  pub fn new(layout: TenantLayout) -> Self {
    Self::with_acquire_timeout(layout, DEFAULT_ACQUIRE_TIMEOUT)
  }

  pub fn with_acquire_timeout(layout: TenantLayout, timeout: Duration) -> Self {
    Self {
      layout,
      pool: ConnectionPool::new(timeout),
    }
  }

  /// A store over a single shared in-memory database — useful for testing.
  pub fn in_memory() -> Self { Self::new(TenantLayout::Memory) }

  /// Resolve a tenant to its connection and table, ensuring the table
  /// exists. Safe to call on every request.
  async fn resolve(
    &self,
    tenant: &TenantId,
  ) -> Result<(tokio_rusqlite::Connection, String)> {
    let conn = self.pool.acquire(self.layout.database_path(tenant)).await?;
    let table = self.layout.table_name(tenant);

    let ddl = schema::table_ddl(&table);
    conn
      .call(move |conn| {
        conn.execute_batch(&ddl)?;
        Ok(())
      })
      .await?;

    Ok((conn, table))
  }

  async fn exists(
    &self,
    conn: &tokio_rusqlite::Connection,
    table: &str,
    id: Uuid,
  ) -> Result<bool> {
    let sql = format!("SELECT 1 FROM \"{table}\" WHERE id = ?1");
    let id_str = encode_uuid(id);
    let found: bool = conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], |_| Ok(true))
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(found)
  }

  async fn fetch_optional(
    &self,
    conn: &tokio_rusqlite::Connection,
    table: &str,
    id: Uuid,
  ) -> Result<Option<Catalog>> {
    let sql = format!("SELECT {COLUMNS} FROM \"{table}\" WHERE id = ?1");
    let id_str = encode_uuid(id);
    let raw: Option<RawCatalog> = conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], RawCatalog::from_row)
            .optional()?,
        )
      })
      .await?;
    raw.map(RawCatalog::into_catalog).transpose()
  }

  /// Re-read a row that is known to exist (just written). A vanished row
  /// surfaces as the engine's no-rows error.
  async fn fetch_existing(
    &self,
    conn: &tokio_rusqlite::Connection,
    table: &str,
    id: Uuid,
  ) -> Result<Catalog> {
    let sql = format!("SELECT {COLUMNS} FROM \"{table}\" WHERE id = ?1");
    let id_str = encode_uuid(id);
    let raw: RawCatalog = conn
      .call(move |conn| {
        Ok(conn.query_row(&sql, rusqlite::params![id_str], RawCatalog::from_row)?)
      })
      .await?;
    raw.into_catalog()
  }
}

// ─── CatalogStore impl ───────────────────────────────────────────────────────

impl CatalogStore for SqliteCatalogStore {
  type Error = Error;

  async fn create(&self, tenant: &TenantId, input: NewCatalog) -> Result<Catalog> {
    let (conn, table) = self.resolve(tenant).await?;

    let id = input.id.unwrap_or_else(Uuid::new_v4);
    let now = Utc::now();
    let created_at = input.created_at.unwrap_or(now);
    let updated_at = input.updated_at.unwrap_or(now);

    let id_str         = encode_uuid(id);
    let tags_str       = encode_string_list(&input.tags)?;
    let locations_str  = encode_string_list(&input.locations)?;
    let created_str    = encode_dt(created_at);
    let updated_str    = encode_dt(updated_at);
    let properties_str = encode_properties(&input.properties);
    let vector_str     = encode_vector(input.vector.as_deref())?;

    let sql = format!(
      "INSERT INTO \"{table}\" ({COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
    );
    conn
      .call(move |conn| {
        conn.execute(
          &sql,
          rusqlite::params![
            id_str,
            input.title,
            input.author,
            input.url,
            tags_str,
            locations_str,
            created_str,
            updated_str,
            input.markdown,
            properties_str,
            vector_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    // Canonical stored form, not the echo of our own input.
    self.fetch_existing(&conn, &table, id).await
  }

  async fn get(&self, tenant: &TenantId, id: Uuid) -> Result<Option<Catalog>> {
    let (conn, table) = self.resolve(tenant).await?;
    self.fetch_optional(&conn, &table, id).await
  }

  async fn update(
    &self,
    tenant: &TenantId,
    id: Uuid,
    patch: CatalogPatch,
  ) -> Result<Option<Catalog>> {
    let (conn, table) = self.resolve(tenant).await?;

    if !self.exists(&conn, &table, id).await? {
      return Ok(None);
    }

    // Dynamic SET clause over the fields actually supplied. `updated_at`
    // is always overwritten, even for an empty patch.
    let mut sets: Vec<&'static str> = Vec::new();
    let mut values: Vec<SqlValue> = Vec::new();

    if let Patch::Set(title) = patch.title {
      sets.push("title = ?");
      values.push(SqlValue::Text(title));
    }
    if let Patch::Set(author) = patch.author {
      sets.push("author = ?");
      values.push(SqlValue::Text(author));
    }
    if let Patch::Set(url) = patch.url {
      sets.push("url = ?");
      values.push(SqlValue::Text(url));
    }
    if let Patch::Set(tags) = patch.tags {
      sets.push("tags = ?");
      values.push(SqlValue::Text(encode_string_list(&tags)?));
    }
    if let Patch::Set(locations) = patch.locations {
      sets.push("locations = ?");
      values.push(SqlValue::Text(encode_string_list(&locations)?));
    }
    if let Patch::Set(markdown) = patch.markdown {
      sets.push("markdown = ?");
      values.push(SqlValue::Text(markdown));
    }
    if let Patch::Set(properties) = patch.properties {
      let blob = properties
        .and_then(|map| encode_properties(&serde_json::Value::Object(map)));
      sets.push("properties = ?");
      values.push(blob.map(SqlValue::Text).unwrap_or(SqlValue::Null));
    }
    if let Patch::Set(vector) = patch.vector {
      let blob = encode_vector(vector.as_deref())?;
      sets.push("vector = ?");
      values.push(blob.map(SqlValue::Text).unwrap_or(SqlValue::Null));
    }

    sets.push("updated_at = ?");
    values.push(SqlValue::Text(encode_dt(Utc::now())));

    values.push(SqlValue::Text(encode_uuid(id)));
    let sql = format!(
      "UPDATE \"{table}\" SET {} WHERE id = ?",
      sets.join(", ")
    );

    conn
      .call(move |conn| {
        conn.execute(&sql, rusqlite::params_from_iter(values))?;
        Ok(())
      })
      .await?;

    Ok(Some(self.fetch_existing(&conn, &table, id).await?))
  }

  async fn delete(&self, tenant: &TenantId, id: Uuid) -> Result<bool> {
    let (conn, table) = self.resolve(tenant).await?;
    let sql = format!("DELETE FROM \"{table}\" WHERE id = ?1");
    let id_str = encode_uuid(id);
    let removed: usize = conn
      .call(move |conn| Ok(conn.execute(&sql, rusqlite::params![id_str])?))
      .await?;
    Ok(removed > 0)
  }

  async fn search(
    &self,
    tenant: &TenantId,
    query: &SearchQuery,
  ) -> Result<Vec<Catalog>> {
    let (conn, table) = self.resolve(tenant).await?;

    let mut conds: Vec<String> = Vec::new();
    let mut values: Vec<SqlValue> = Vec::new();

    if !query.tags.is_empty() {
      // Membership of ANY supplied tag (OR), via json_each over the
      // JSON-array tags column.
      let tag_conds: Vec<&str> = query
        .tags
        .iter()
        .map(|tag| {
          values.push(SqlValue::Text(tag.clone()));
          "EXISTS (SELECT 1 FROM json_each(tags) WHERE json_each.value = ?)"
        })
        .collect();
      conds.push(format!("({})", tag_conds.join(" OR ")));
    }

    if let Some(text) = query.text.as_deref() {
      // LIKE is case-insensitive for ASCII in SQLite.
      let pattern = like_pattern(text);
      values.push(SqlValue::Text(pattern.clone()));
      values.push(SqlValue::Text(pattern));
      conds.push(
        "(title LIKE ? ESCAPE '\\' OR markdown LIKE ? ESCAPE '\\')".to_string(),
      );
    }

    let where_clause = if conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", conds.join(" AND "))
    };

    let sql = format!(
      "SELECT {COLUMNS} FROM \"{table}\"
       {where_clause}
       ORDER BY updated_at DESC, id"
    );

    let raws: Vec<RawCatalog> = conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(values), RawCatalog::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCatalog::into_catalog).collect()
  }

  async fn vector_search(
    &self,
    tenant: &TenantId,
    vector: &[f32],
    limit: usize,
  ) -> Result<Vec<Catalog>> {
    let (conn, table) = self.resolve(tenant).await?;

    let sql = format!(
      "SELECT {COLUMNS} FROM \"{table}\" WHERE vector IS NOT NULL"
    );
    let raws: Vec<RawCatalog> = conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawCatalog::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    // Per-tenant tables are small; score in process rather than pulling in
    // a vector extension.
    let mut scored: Vec<(f32, Catalog)> = Vec::with_capacity(raws.len());
    for raw in raws {
      let catalog = raw.into_catalog()?;
      if let Some(v) = catalog.vector.as_deref() {
        scored.push((cosine_similarity(vector, v), catalog));
      }
    }
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.truncate(limit);
    Ok(scored.into_iter().map(|(_, c)| c).collect())
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Build a `%…%` substring pattern, escaping LIKE metacharacters in the
/// user-supplied text.
fn like_pattern(text: &str) -> String {
  let mut escaped = String::with_capacity(text.len() + 2);
  for c in text.chars() {
    if matches!(c, '%' | '_' | '\\') {
      escaped.push('\\');
    }
    escaped.push(c);
  }
  format!("%{escaped}%")
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
  if a.len() != b.len() || a.is_empty() {
    return 0.0;
  }
  let mut dot = 0.0f32;
  let mut norm_a = 0.0f32;
  let mut norm_b = 0.0f32;
  for (x, y) in a.iter().zip(b) {
    dot += x * y;
    norm_a += x * x;
    norm_b += y * y;
  }
  if norm_a == 0.0 || norm_b == 0.0 {
    return 0.0;
  }
  dot / (norm_a.sqrt() * norm_b.sqrt())
}
