//! SQL DDL for per-tenant catalog tables.
//!
//! Unlike a fixed-schema store, the table name here is tenant-derived, so the
//! DDL is generated per namespace. Names reaching this module have already
//! passed [`cabinet_core::tenant`] validation and are still double-quoted.

/// Connection-level pragmas, executed once per opened database file.
pub const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

/// DDL for one tenant's catalog table; idempotent thanks to
/// `CREATE TABLE IF NOT EXISTS`.
///
/// The fixed column set: id, title, author, url, tags, locations,
/// created_at, updated_at, markdown, properties — plus the optional
/// `vector` similarity key.
pub fn table_ddl(table: &str) -> String {
  format!(
    "CREATE TABLE IF NOT EXISTS \"{table}\" (
        id          TEXT PRIMARY KEY,  -- hyphenated lowercase UUID
        title       TEXT NOT NULL,
        author      TEXT NOT NULL,
        url         TEXT NOT NULL,
        tags        TEXT NOT NULL DEFAULT '[]',  -- JSON array
        locations   TEXT NOT NULL DEFAULT '[]',  -- JSON array
        created_at  TEXT NOT NULL,     -- RFC 3339 UTC; immutable
        updated_at  TEXT NOT NULL,     -- RFC 3339 UTC; reset on mutation
        markdown    TEXT NOT NULL,
        properties  TEXT,              -- JSON object or NULL
        vector      TEXT               -- JSON array of f32 or NULL
    );
    CREATE INDEX IF NOT EXISTS \"{table}_updated_idx\"
        ON \"{table}\"(updated_at);"
  )
}
